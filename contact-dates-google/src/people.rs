//! Google People API directory adapter.

use async_trait::async_trait;
use contact_dates_core::service::ContactPage;
use contact_dates_core::{
    ContactDate, ContactRecord, DateFact, DirectoryService, FactKind, LabelMembership, ServiceError,
};
use serde::Deserialize;
use url::Url;

use crate::http::ApiClient;

const CONNECTIONS_URL: &str = "https://people.googleapis.com/v1/people/me/connections";
const PERSON_FIELDS: &str = "names,birthdays,events,memberships";

pub struct PeopleDirectory {
    api: ApiClient,
}

impl PeopleDirectory {
    pub fn new(api: ApiClient) -> Self {
        PeopleDirectory { api }
    }
}

#[async_trait]
impl DirectoryService for PeopleDirectory {
    async fn list_connections(
        &self,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<ContactPage, ServiceError> {
        let url = connections_url(page_size, page_token)?;
        let response: ConnectionsResponse = self.api.get(url).await?;
        Ok(response.into())
    }
}

fn connections_url(page_size: u32, page_token: Option<&str>) -> Result<Url, ServiceError> {
    let mut url = Url::parse(CONNECTIONS_URL).map_err(|e| ServiceError::Rejected(e.to_string()))?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("pageSize", &page_size.to_string());
        query.append_pair("personFields", PERSON_FIELDS);
        if let Some(token) = page_token {
            query.append_pair("pageToken", token);
        }
    }
    Ok(url)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionsResponse {
    #[serde(default)]
    connections: Vec<Person>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Person {
    resource_name: String,
    #[serde(default)]
    names: Vec<Name>,
    #[serde(default)]
    birthdays: Vec<Birthday>,
    #[serde(default)]
    events: Vec<PersonEvent>,
    #[serde(default)]
    memberships: Vec<Membership>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Name {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Birthday {
    date: Option<GoogleDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersonEvent {
    date: Option<GoogleDate>,
    formatted_type: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// `google.type.Date`: zero (or absent) fields mean "not specified".
#[derive(Debug, Clone, Copy, Deserialize)]
struct GoogleDate {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Membership {
    contact_group_membership: Option<GroupMembership>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupMembership {
    contact_group_id: Option<String>,
    contact_group_resource_name: Option<String>,
}

impl GoogleDate {
    /// `None` unless both month and day are set.
    fn to_fact(self) -> Option<DateFact> {
        let month = self.month.filter(|&m| m > 0)?;
        let day = self.day.filter(|&d| d > 0)?;
        let year = self.year.filter(|&y| y > 0);
        Some(DateFact::new(month, day, year))
    }
}

impl From<ConnectionsResponse> for ContactPage {
    fn from(response: ConnectionsResponse) -> Self {
        ContactPage {
            contacts: response.connections.into_iter().map(ContactRecord::from).collect(),
            next_page_token: response.next_page_token,
        }
    }
}

impl From<Person> for ContactRecord {
    fn from(person: Person) -> Self {
        let display_name = person
            .names
            .into_iter()
            .next()
            .and_then(|n| n.display_name)
            .filter(|n| !n.is_empty());

        let memberships = person
            .memberships
            .into_iter()
            .filter_map(|m| m.contact_group_membership)
            .filter_map(|g| g.contact_group_resource_name.or(g.contact_group_id))
            .map(|group_id| LabelMembership { group_id })
            .collect();

        let birthdays = person.birthdays.into_iter().map(|b| ContactDate {
            kind: FactKind::Birthday,
            date: b.date.and_then(GoogleDate::to_fact),
            label: None,
        });

        let customs = person.events.into_iter().map(|e| ContactDate {
            kind: FactKind::Custom,
            date: e.date.and_then(GoogleDate::to_fact),
            label: e.formatted_type.or(e.kind).filter(|l| !l.is_empty()),
        });

        ContactRecord {
            resource_name: person.resource_name,
            display_name,
            memberships,
            dates: birthdays.chain(customs).collect(),
        }
    }
}

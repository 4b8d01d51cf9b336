use common::domain::{DomainResult, Person};
use common::store::{ItemQuery, StoreClient};
use tracing::info;

/// Result rows for the ordered offset route.
const OFFSET_QUERY_LIMIT: usize = 30;
/// Page size for the SSE paged stream.
const PREFERRED_PAGE_SIZE: usize = 10;

/// Person queries against a named database/container.
///
/// Every call logs the store's per-call diagnostics; the request charge is
/// what operators size container throughput from.
pub struct PersonService {
    client: StoreClient,
}

impl PersonService {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    pub async fn list_all(&self, database: &str, container: &str) -> DomainResult<Vec<Person>> {
        let response = self
            .client
            .database(database)
            .container(container)
            .query::<Person>(&ItemQuery::All)
            .await?;
        info!(
            container = %container,
            items = response.items.len(),
            request_charge = response.diagnostics.request_charge,
            "listed all persons"
        );
        Ok(response.items)
    }

    /// Persons ordered ascending by age, skipping `offset` rows. The
    /// caller has already validated the offset; the limit is fixed.
    pub async fn list_by_age_offset(
        &self,
        database: &str,
        container: &str,
        offset: usize,
    ) -> DomainResult<Vec<Person>> {
        let response = self
            .client
            .database(database)
            .container(container)
            .query::<Person>(&ItemQuery::OrderedByField {
                field: "age".to_string(),
                offset,
                limit: OFFSET_QUERY_LIMIT,
            })
            .await?;
        info!(
            container = %container,
            offset,
            items = response.items.len(),
            request_charge = response.diagnostics.request_charge,
            "listed persons by age offset"
        );
        Ok(response.items)
    }

    /// All persons grouped into preferred-size pages, for the SSE stream.
    pub async fn paged(&self, database: &str, container: &str) -> DomainResult<Vec<Vec<Person>>> {
        let items = self.list_all(database, container).await?;
        let pages = items
            .chunks(PREFERRED_PAGE_SIZE)
            .map(<[Person]>::to_vec)
            .collect();
        Ok(pages)
    }

    pub async fn find_by_id(
        &self,
        database: &str,
        container: &str,
        id: &str,
    ) -> DomainResult<Option<Person>> {
        let response = self
            .client
            .database(database)
            .container(container)
            .query::<Person>(&ItemQuery::ById(id.to_string()))
            .await?;
        info!(
            container = %container,
            id = %id,
            request_charge = response.diagnostics.request_charge,
            "looked up person by id"
        );
        Ok(response.items.into_iter().next())
    }

    /// Stores a person under a freshly generated id and returns the
    /// stored record. Returns `None` when the database does not exist.
    pub async fn add_person(
        &self,
        database: &str,
        container: &str,
        person: Person,
    ) -> DomainResult<Option<Person>> {
        if !self.client.database_exists(database).await? {
            return Ok(None);
        }
        let created = self
            .client
            .database(database)
            .container(container)
            .create_item(&person.with_generated_id())
            .await?;
        info!(
            container = %container,
            id = ?created.item.id,
            request_charge = created.diagnostics.request_charge,
            "created person"
        );
        Ok(Some(created.item))
    }
}

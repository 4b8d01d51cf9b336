use chrono::Utc;
use common::domain::{ContainerOperation, ContainerRequest, DatabaseOperation, DomainResult};
use common::store::StoreClient;
use tracing::info;

/// Database and container provisioning.
///
/// Container operations are guarded on database existence: a missing
/// database yields `None` without touching the provisioning API, which is
/// the sample's lenient convention for bad input.
pub struct ProvisioningService {
    client: StoreClient,
}

impl ProvisioningService {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    pub async fn create_database(&self, name: &str) -> DomainResult<DatabaseOperation> {
        let diagnostics = self.client.create_database(name).await?;
        info!(
            database = %name,
            request_charge = diagnostics.request_charge,
            "created database"
        );
        Ok(DatabaseOperation {
            db_name: name.to_string(),
            executed_date_time: Utc::now(),
        })
    }

    pub async fn delete_database(&self, name: &str) -> DomainResult<DatabaseOperation> {
        self.client.delete_database(name).await?;
        info!(database = %name, "deleted database");
        Ok(DatabaseOperation {
            db_name: name.to_string(),
            executed_date_time: Utc::now(),
        })
    }

    pub async fn list_databases(&self) -> DomainResult<Vec<String>> {
        self.client.list_databases().await
    }

    pub async fn create_container(
        &self,
        database: &str,
        request: &ContainerRequest,
    ) -> DomainResult<Option<ContainerOperation>> {
        if !self.client.database_exists(database).await? {
            return Ok(None);
        }
        let diagnostics = self
            .client
            .database(database)
            .create_container(
                &request.container_name,
                &request.partition_name,
                request.request_unit,
            )
            .await?;
        info!(
            database = %database,
            container = %request.container_name,
            partition_key = %request.partition_name,
            request_unit = request.request_unit,
            request_charge = diagnostics.request_charge,
            "created container"
        );
        Ok(Some(ContainerOperation {
            container_name: request.container_name.clone(),
            executed_date_time: Utc::now(),
        }))
    }

    pub async fn list_containers(&self, database: &str) -> DomainResult<Option<Vec<String>>> {
        if !self.client.database_exists(database).await? {
            return Ok(None);
        }
        Ok(Some(self.client.database(database).list_containers().await?))
    }

    pub async fn delete_container(
        &self,
        database: &str,
        container: &str,
    ) -> DomainResult<Option<ContainerOperation>> {
        if !self.client.database_exists(database).await? {
            return Ok(None);
        }
        self.client
            .database(database)
            .delete_container(container)
            .await?;
        info!(database = %database, container = %container, "deleted container");
        Ok(Some(ContainerOperation {
            container_name: container.to_string(),
            executed_date_time: Utc::now(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::store::StoreConfig;

    fn service() -> ProvisioningService {
        let client =
            StoreClient::connect(StoreConfig::new("https://localhost:8081/", "key")).unwrap();
        ProvisioningService::new(client)
    }

    fn container_request() -> ContainerRequest {
        ContainerRequest {
            container_name: "personmanage".to_string(),
            partition_name: "/lastName".to_string(),
            request_unit: 1000,
        }
    }

    #[tokio::test]
    async fn create_container_in_missing_database_is_empty() {
        let service = service();
        let result = service
            .create_container("NO_SUCH_DB", &container_request())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn provisioning_round_trip() {
        let service = service();
        let created = service.create_database("PERSON_DB").await.unwrap();
        assert_eq!(created.db_name, "PERSON_DB");
        assert_eq!(
            service.list_databases().await.unwrap(),
            vec!["PERSON_DB".to_string()]
        );

        let container = service
            .create_container("PERSON_DB", &container_request())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(container.container_name, "personmanage");
        assert_eq!(
            service.list_containers("PERSON_DB").await.unwrap().unwrap(),
            vec!["personmanage".to_string()]
        );

        service
            .delete_container("PERSON_DB", "personmanage")
            .await
            .unwrap()
            .unwrap();
        service.delete_database("PERSON_DB").await.unwrap();
        assert!(service.list_containers("PERSON_DB").await.unwrap().is_none());
    }
}

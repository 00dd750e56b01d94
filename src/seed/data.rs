use anyhow::{Context, Result};

use crate::model::{
    definition_fqn, generate_id, touch, EntityHeader, EntityRow, ServiceType,
    TestConnectionDefinition, TestConnectionStep, UserContext,
};
use crate::store::{EntityStore, Store};

/// Helper function to create a step description
fn step(name: &str, description: &str, error_message: &str, mandatory: bool) -> TestConnectionStep {
    TestConnectionStep {
        name: name.to_string(),
        description: description.to_string(),
        error_message: error_message.to_string(),
        mandatory,
        short_circuit: false,
    }
}

/// The checklist shipped for a connector.
pub fn test_connection_definition(service_type: ServiceType) -> TestConnectionDefinition {
    let connector = service_type.as_str();
    let mut check_access = step(
        "CheckAccess",
        "Validate that we can properly reach the database and authenticate with the given credentials.",
        "Failed to connect to the database, please validate the credentials and the network configuration.",
        true,
    );
    check_access.short_circuit = true;

    let steps = vec![
        check_access,
        step(
            "GetSchemas",
            "List all the schemas available to the user.",
            "Failed to fetch schemas, please validate if the user has enough privilege to fetch schemas.",
            true,
        ),
        step(
            "GetTables",
            "From a given schema, list the tables belonging to that schema.",
            "Failed to fetch tables, please validate if the user has enough privilege to fetch tables.",
            true,
        ),
        step(
            "GetViews",
            "From a given schema, list the views belonging to that schema.",
            "Failed to fetch views, please validate if the user has enough privilege to fetch views.",
            false,
        ),
    ];

    TestConnectionDefinition {
        header: EntityHeader::new(
            generate_id(),
            connector.to_string(),
            definition_fqn(connector),
            Some(format!("{} Test Connection", connector)),
            Some(format!(
                "This Test Connection validates the access against the {} database and basic metadata extraction of schemas and tables.",
                connector
            )),
        ),
        steps,
    }
}

/// Insert the test connection definitions of every supported connector that
/// are not stored yet. Existing definitions are left alone.
pub async fn load_seed_data<S: Store>(store: &S) -> Result<usize> {
    let user = UserContext::system();
    let mut inserted = 0;

    for service_type in ServiceType::ALL {
        let mut definition = test_connection_definition(service_type);
        let fqn = definition.header.fully_qualified_name.clone();

        if EntityStore::<TestConnectionDefinition>::get_by_fqn(store, &fqn)
            .await
            .with_context(|| format!("Failed to look up '{}'", fqn))?
            .is_some()
        {
            log::debug!("Test connection definition '{}' already present", fqn);
            continue;
        }

        touch(&mut definition, user.audit_name());
        EntityStore::<TestConnectionDefinition>::insert(store, &EntityRow::from_entity(definition))
            .await
            .with_context(|| format!("Failed to seed '{}'", fqn))?;
        log::info!("Seeded test connection definition '{}'", fqn);
        inserted += 1;
    }

    Ok(inserted)
}

//! Calling-convention adapter tests against a mocked schema client.

use super::support::{attribute, collection, database, index};
use crate::schema::{
    adapters::RemoteSchema,
    domain::{AttributeDefault, AttributeSpec, IndexSpec, RemoteObjectStatus, SortOrder},
    ports::{CallArgs, CallingConvention, SchemaClientError, SchemaMethod, client::MockSchemaClient},
};
use rstest::rstest;
use serde_json::{Value, json};
use std::sync::Arc;

fn adapter(client: MockSchemaClient, convention: CallingConvention) -> RemoteSchema {
    RemoteSchema::new(Arc::new(client), convention)
}

#[rstest]
#[tokio::test]
async fn missing_methods_fail_before_any_call() {
    let mut client = MockSchemaClient::new();
    client.expect_supports().return_const(false);
    client.expect_call().never();

    let result = adapter(client, CallingConvention::Object)
        .get_collection(&database(), &collection("terms"))
        .await;

    assert!(matches!(
        result,
        Err(SchemaClientError::MethodNotFound(SchemaMethod::GetCollection))
    ));
}

#[rstest]
#[tokio::test]
async fn required_attributes_are_sent_without_a_default() {
    let mut client = MockSchemaClient::new();
    client.expect_supports().return_const(true);
    client
        .expect_call()
        .withf(|method, args| {
            *method == SchemaMethod::CreateBooleanAttribute
                && args.get(*method, "required") == Some(&Value::Bool(true))
                && args.get(*method, "default") == Some(&Value::Null)
        })
        .times(1)
        .returning(|_, _| Ok(json!({})));

    let spec = AttributeSpec::boolean(attribute("active"))
        .required()
        .with_default(AttributeDefault::Boolean(true));

    adapter(client, CallingConvention::Object)
        .create_attribute(&database(), &collection("departments"), &spec)
        .await
        .expect("create call succeeds");
}

#[rstest]
#[tokio::test]
async fn object_convention_sends_named_parameters() {
    let mut client = MockSchemaClient::new();
    client.expect_supports().return_const(true);
    client
        .expect_call()
        .withf(|method, args| {
            *method == SchemaMethod::CreateStringAttribute
                && *args
                    == CallArgs::Object(
                        json!({
                            "databaseId": "main",
                            "collectionId": "sections",
                            "key": "name",
                            "size": 64,
                            "required": false,
                            "default": "Unnamed",
                            "array": false,
                        })
                        .as_object()
                        .cloned()
                        .unwrap_or_default(),
                    )
        })
        .times(1)
        .returning(|_, _| Ok(json!({})));

    let spec = AttributeSpec::string(attribute("name"), 64)
        .with_default(AttributeDefault::String("Unnamed".to_owned()));

    adapter(client, CallingConvention::Object)
        .create_attribute(&database(), &collection("sections"), &spec)
        .await
        .expect("create call succeeds");
}

#[rstest]
#[tokio::test]
async fn positional_convention_follows_the_signature_order() {
    let mut client = MockSchemaClient::new();
    client.expect_supports().return_const(true);
    client
        .expect_call()
        .withf(|method, args| {
            *method == SchemaMethod::CreateIntegerAttribute
                && *args
                    == CallArgs::Positional(vec![
                        json!("main"),
                        json!("sections"),
                        json!("capacity"),
                        json!(false),
                        json!(1),
                        json!(500),
                        json!(40),
                        json!(false),
                    ])
        })
        .times(1)
        .returning(|_, _| Ok(json!({})));

    let spec = AttributeSpec::integer(attribute("capacity"))
        .with_range(1, 500)
        .with_default(AttributeDefault::Integer(40));

    adapter(client, CallingConvention::Positional)
        .create_attribute(&database(), &collection("sections"), &spec)
        .await
        .expect("create call succeeds");
}

#[rstest]
#[tokio::test]
async fn index_creation_lists_attributes_and_orders() {
    let mut client = MockSchemaClient::new();
    client.expect_supports().return_const(true);
    client
        .expect_call()
        .withf(|method, args| {
            *method == SchemaMethod::CreateIndex
                && args.get_str(*method, "type") == Some("unique")
                && args.get(*method, "attributes") == Some(&json!(["termId", "name"]))
                && args.get(*method, "orders") == Some(&json!(["ASC", "DESC"]))
        })
        .times(1)
        .returning(|_, _| Ok(json!({})));

    let spec = IndexSpec::unique(index("uniq_sections_term_name"))
        .on(attribute("termId"))
        .on_ordered(attribute("name"), SortOrder::Desc);

    adapter(client, CallingConvention::Object)
        .create_index(&database(), &collection("sections"), &spec)
        .await
        .expect("create call succeeds");
}

#[rstest]
#[tokio::test]
async fn decodes_attribute_snapshots() {
    let mut client = MockSchemaClient::new();
    client.expect_supports().return_const(true);
    client.expect_call().returning(|_, _| {
        Ok(json!({
            "key": "termId",
            "type": "string",
            "status": "failed",
            "error": "  Attribute size exceeds limit ",
        }))
    });

    let snapshot = adapter(client, CallingConvention::Object)
        .get_attribute(&database(), &collection("sections"), &attribute("termId"))
        .await
        .expect("lookup succeeds");

    assert_eq!(snapshot.status, RemoteObjectStatus::Failed);
    assert_eq!(snapshot.diagnostic(), Some("Attribute size exceeds limit"));
}

#[rstest]
#[tokio::test]
async fn malformed_snapshots_are_reported() {
    let mut client = MockSchemaClient::new();
    client.expect_supports().return_const(true);
    client
        .expect_call()
        .returning(|_, _| Ok(json!({ "key": "termId", "status": "exploded" })));

    let result = adapter(client, CallingConvention::Object)
        .get_attribute(&database(), &collection("sections"), &attribute("termId"))
        .await;

    assert!(matches!(
        result,
        Err(SchemaClientError::MalformedResponse { operation, .. }) if operation == "getAttribute"
    ));
}

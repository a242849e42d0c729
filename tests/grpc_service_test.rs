//! End-to-end tests for `GrpcProviderServer` driving a minimal in-memory
//! resource through the full RPC surface, without a network round trip.

use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use tfplug::context::Context;
use tfplug::grpc::GrpcProviderServer;
use tfplug::proto;
use tfplug::proto::provider_server::Provider as ProtoProvider;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, Provider, ProviderMetaSchemaRequest,
    ProviderMetaSchemaResponse, ProviderMetadataRequest, ProviderMetadataResponse,
    ProviderSchemaRequest, ProviderSchemaResponse, ResourceFactory, StopProviderRequest,
    StopProviderResponse, ValidateProviderConfigRequest, ValidateProviderConfigResponse,
};
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource,
    ModifyPlanRequest, ModifyPlanResponse, ReadResourceRequest, ReadResourceResponse, Resource,
    ResourceMetadataRequest, ResourceMetadataResponse, ResourceSchemaRequest,
    ResourceSchemaResponse, ResourceWithConfigure, ResourceWithImportState,
    ResourceWithModifyPlan, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{DynamicValue, ServerCapabilities};

struct WidgetResource;

#[async_trait]
impl Resource for WidgetResource {
    fn type_name(&self) -> &str {
        "test_widget"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: "test_widget".to_string(),
        }
    }

    async fn schema(&self, _ctx: Context, _request: ResourceSchemaRequest) -> ResourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(1)
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .required()
                    .build(),
            )
            .build();
        ResourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: vec![],
        }
    }

    async fn create(&self, _ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let mut state = request.planned_state;
        let path = tfplug::types::AttributePath::root().attribute("id");
        let _ = state.set_string(&path, "widget-1".to_string());
        CreateResourceResponse {
            new_state: state,
            private: vec![],
            diagnostics: vec![],
        }
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        ReadResourceResponse {
            new_state: Some(request.current_state),
            diagnostics: vec![],
            private: request.private,
        }
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        UpdateResourceResponse {
            new_state: request.planned_state,
            private: vec![],
            diagnostics: vec![],
        }
    }

    async fn delete(&self, _ctx: Context, _request: DeleteResourceRequest) -> DeleteResourceResponse {
        DeleteResourceResponse {
            diagnostics: vec![],
        }
    }

    fn as_modify_plan(&self) -> Option<&dyn ResourceWithModifyPlan> {
        Some(self)
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithConfigure for WidgetResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        _request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        ConfigureResourceResponse {
            diagnostics: vec![],
        }
    }
}

#[async_trait]
impl ResourceWithModifyPlan for WidgetResource {
    async fn modify_plan(&self, _ctx: Context, request: ModifyPlanRequest) -> ModifyPlanResponse {
        ModifyPlanResponse {
            planned_state: request.proposed_new_state,
            requires_replace: vec![],
            planned_private: request.prior_private,
            diagnostics: vec![],
        }
    }
}

#[async_trait]
impl ResourceWithImportState for WidgetResource {
    async fn import_state(
        &self,
        _ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut state = DynamicValue::null();
        let path = tfplug::types::AttributePath::root().attribute("id");
        let _ = state.set_string(&path, request.id.clone());
        ImportResourceStateResponse {
            imported_resources: vec![ImportedResource {
                type_name: "test_widget".to_string(),
                state,
                private: vec![],
            }],
            diagnostics: vec![],
        }
    }
}

struct TestProvider;

#[async_trait]
impl Provider for TestProvider {
    fn type_name(&self) -> &str {
        "test"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: "test".to_string(),
            server_capabilities: ServerCapabilities {
                plan_destroy: false,
                get_provider_schema_optional: false,
                move_resource_state: false,
            },
        }
    }

    async fn schema(&self, _ctx: Context, _request: ProviderSchemaRequest) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: SchemaBuilder::new().build(),
            diagnostics: vec![],
        }
    }

    async fn meta_schema(
        &self,
        _ctx: Context,
        _request: ProviderMetaSchemaRequest,
    ) -> ProviderMetaSchemaResponse {
        ProviderMetaSchemaResponse {
            schema: None,
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        _request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        ConfigureProviderResponse {
            diagnostics: vec![],
            provider_data: Some(Arc::new(()) as Arc<dyn Any + Send + Sync>),
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateProviderConfigRequest,
    ) -> ValidateProviderConfigResponse {
        ValidateProviderConfigResponse {
            diagnostics: vec![],
        }
    }

    async fn stop(&self, _ctx: Context, _request: StopProviderRequest) -> StopProviderResponse {
        StopProviderResponse { error: None }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut factories: HashMap<String, ResourceFactory> = HashMap::new();
        factories.insert(
            "test_widget".to_string(),
            Box::new(|| Box::new(WidgetResource) as Box<dyn ResourceWithConfigure>),
        );
        factories
    }
}

fn null_dynamic_value() -> proto::DynamicValue {
    proto::DynamicValue {
        msgpack: DynamicValue::null().encode_msgpack().unwrap(),
        json: vec![],
    }
}

#[tokio::test]
async fn get_metadata_lists_resource_types() {
    let server = GrpcProviderServer::new(TestProvider);
    let response = server
        .get_metadata(tonic::Request::new(proto::get_metadata::Request {}))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(response.resources.len(), 1);
    assert_eq!(response.resources[0].type_name, "test_widget");
}

#[tokio::test]
async fn get_provider_schema_includes_resource_schema() {
    let server = GrpcProviderServer::new(TestProvider);
    let response = server
        .get_provider_schema(tonic::Request::new(proto::get_provider_schema::Request {}))
        .await
        .unwrap()
        .into_inner();
    let resource_schema = response.resource_schemas.get("test_widget").unwrap();
    let block = resource_schema.block.as_ref().unwrap();
    assert_eq!(block.attributes.len(), 2);
}

#[tokio::test]
async fn unknown_resource_type_is_a_protocol_violation() {
    let server = GrpcProviderServer::new(TestProvider);
    let result = server
        .validate_resource_config(tonic::Request::new(proto::validate_resource_config::Request {
            type_name: "nonexistent".to_string(),
            config: Some(null_dynamic_value()),
        }))
        .await;
    let status = result.unwrap_err();
    assert_eq!(status.code(), tonic::Code::InvalidArgument);
}

#[tokio::test]
async fn apply_resource_change_create_then_destroy() {
    let server = GrpcProviderServer::new(TestProvider);

    let mut planned = DynamicValue::null();
    let path = tfplug::types::AttributePath::root().attribute("name");
    planned.set_string(&path, "widget".to_string()).unwrap();
    let planned_proto = proto::DynamicValue {
        msgpack: planned.encode_msgpack().unwrap(),
        json: vec![],
    };

    let create_response = server
        .apply_resource_change(tonic::Request::new(proto::apply_resource_change::Request {
            type_name: "test_widget".to_string(),
            prior_state: Some(null_dynamic_value()),
            planned_state: Some(planned_proto),
            config: Some(null_dynamic_value()),
            planned_private: vec![],
        }))
        .await
        .unwrap()
        .into_inner();
    assert!(create_response.diagnostics.is_empty());
    let created_state = create_response.new_state.unwrap();
    assert!(!created_state.msgpack.is_empty());

    let destroy_response = server
        .apply_resource_change(tonic::Request::new(proto::apply_resource_change::Request {
            type_name: "test_widget".to_string(),
            prior_state: Some(proto::DynamicValue {
                msgpack: created_state.msgpack,
                json: vec![],
            }),
            planned_state: Some(null_dynamic_value()),
            config: Some(null_dynamic_value()),
            planned_private: vec![],
        }))
        .await
        .unwrap()
        .into_inner();
    assert!(destroy_response.diagnostics.is_empty());
}

#[tokio::test]
async fn import_resource_state_dispatches_to_optional_trait() {
    let server = GrpcProviderServer::new(TestProvider);
    let response = server
        .import_resource_state(tonic::Request::new(proto::import_resource_state::Request {
            type_name: "test_widget".to_string(),
            id: "widget-123".to_string(),
        }))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(response.imported_resources.len(), 1);
    assert_eq!(response.imported_resources[0].type_name, "test_widget");
}

#[tokio::test]
async fn upgrade_resource_state_without_upgrader_decodes_json_raw_state() {
    let server = GrpcProviderServer::new(TestProvider);
    let mut state = DynamicValue::null();
    let path = tfplug::types::AttributePath::root().attribute("name");
    state.set_string(&path, "widget".to_string()).unwrap();
    let json = state.encode_json().unwrap();

    let response = server
        .upgrade_resource_state(tonic::Request::new(proto::upgrade_resource_state::Request {
            type_name: "test_widget".to_string(),
            version: 1,
            raw_state: Some(proto::RawState {
                json,
                flatmap: Default::default(),
            }),
        }))
        .await
        .unwrap()
        .into_inner();
    assert!(response.diagnostics.is_empty());
    assert!(response.upgraded_state.is_some());
}

#[tokio::test]
async fn plan_resource_change_is_identity_for_new_resource() {
    let server = GrpcProviderServer::new(TestProvider);

    let mut proposed = DynamicValue::null();
    let path = tfplug::types::AttributePath::root().attribute("name");
    proposed.set_string(&path, "widget".to_string()).unwrap();
    let proposed_proto = proto::DynamicValue {
        msgpack: proposed.encode_msgpack().unwrap(),
        json: vec![],
    };

    let response = server
        .plan_resource_change(tonic::Request::new(proto::plan_resource_change::Request {
            type_name: "test_widget".to_string(),
            prior_state: Some(null_dynamic_value()),
            proposed_new_state: Some(proposed_proto.clone()),
            config: Some(null_dynamic_value()),
            prior_private: vec![],
            client_capabilities: None,
        }))
        .await
        .unwrap()
        .into_inner();

    assert!(response.diagnostics.is_empty());
    assert!(response.requires_replace.is_empty());
    let planned = response.planned_state.unwrap();
    assert_eq!(planned.msgpack, proposed_proto.msgpack);
}

struct PanicResource;

#[async_trait]
impl Resource for PanicResource {
    fn type_name(&self) -> &str {
        "test_panicker"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: "test_panicker".to_string(),
        }
    }

    async fn schema(&self, _ctx: Context, _request: ResourceSchemaRequest) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: SchemaBuilder::new().build(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: vec![],
        }
    }

    async fn create(&self, _ctx: Context, _request: CreateResourceRequest) -> CreateResourceResponse {
        unreachable!()
    }

    async fn read(&self, _ctx: Context, _request: ReadResourceRequest) -> ReadResourceResponse {
        panic!("simulated handler failure")
    }

    async fn update(&self, _ctx: Context, _request: UpdateResourceRequest) -> UpdateResourceResponse {
        unreachable!()
    }

    async fn delete(&self, _ctx: Context, _request: DeleteResourceRequest) -> DeleteResourceResponse {
        unreachable!()
    }
}

#[async_trait]
impl ResourceWithConfigure for PanicResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        _request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        ConfigureResourceResponse {
            diagnostics: vec![],
        }
    }
}

struct PanickingProvider;

#[async_trait]
impl Provider for PanickingProvider {
    fn type_name(&self) -> &str {
        "test"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: "test".to_string(),
            server_capabilities: ServerCapabilities {
                plan_destroy: false,
                get_provider_schema_optional: false,
                move_resource_state: false,
            },
        }
    }

    async fn schema(&self, _ctx: Context, _request: ProviderSchemaRequest) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: SchemaBuilder::new().build(),
            diagnostics: vec![],
        }
    }

    async fn meta_schema(
        &self,
        _ctx: Context,
        _request: ProviderMetaSchemaRequest,
    ) -> ProviderMetaSchemaResponse {
        ProviderMetaSchemaResponse {
            schema: None,
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        _request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        ConfigureProviderResponse {
            diagnostics: vec![],
            provider_data: None,
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateProviderConfigRequest,
    ) -> ValidateProviderConfigResponse {
        ValidateProviderConfigResponse {
            diagnostics: vec![],
        }
    }

    async fn stop(&self, _ctx: Context, _request: StopProviderRequest) -> StopProviderResponse {
        StopProviderResponse { error: None }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut factories: HashMap<String, ResourceFactory> = HashMap::new();
        factories.insert(
            "test_panicker".to_string(),
            Box::new(|| Box::new(PanicResource) as Box<dyn ResourceWithConfigure>),
        );
        factories
    }
}

#[tokio::test]
async fn handler_panic_becomes_a_single_error_diagnostic() {
    let server = GrpcProviderServer::new(PanickingProvider);

    let response = server
        .read_resource(tonic::Request::new(proto::read_resource::Request {
            type_name: "test_panicker".to_string(),
            current_state: Some(null_dynamic_value()),
            private: vec![],
        }))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(
        response.diagnostics[0].severity,
        proto::diagnostic::Severity::Error as i32
    );
    assert!(response.new_state.is_none());
}

#[tokio::test]
async fn stop_provider_succeeds() {
    let server = GrpcProviderServer::new(TestProvider);
    let response = server
        .stop_provider(tonic::Request::new(proto::stop_provider::Request {}))
        .await
        .unwrap()
        .into_inner();
    assert!(response.error.is_empty());
}

//! gRPC server implementation for the Terraform Plugin Protocol
//!
//! Translates between the wire types in [`crate::proto`] and the framework
//! types in [`crate::resource`]/[`crate::provider`]. Every RPC follows the
//! same shape: decode inputs, dispatch to the provider/resource under
//! [`GrpcProviderServer::guarded`], encode the response. In-band failures
//! surface as diagnostics on the response, never as a gRPC error — only
//! malformed wire input, or a handler that panics outright, takes that path,
//! and even a panic still comes back as a normal response (§8).

use crate::context::Context;
use crate::error::TfplugError;
use crate::proto;
use crate::provider::Provider;
use crate::resource::{
    Resource, ResourceWithConfigure, ResourceWithImportState, ResourceWithModifyPlan,
    ResourceWithUpgradeState,
};
use crate::schema::{
    Attribute, Block, NestedBlock, NestedType, NestingMode, ObjectNestingMode, Schema, StringKind,
};
use crate::types::{
    AttributePath, AttributePathStep, Diagnostic, Diagnostics, DiagnosticSeverity, DynamicValue,
    RawState,
};
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock, Semaphore};
use tonic::{Request, Response, Status};

type GrpcResult<T> = std::result::Result<T, Status>;

/// gRPC provider server that implements the Terraform Plugin Protocol
pub struct GrpcProviderServer<P: Provider> {
    provider: Arc<RwLock<P>>,
    provider_data: Arc<RwLock<Option<Arc<dyn std::any::Any + Send + Sync>>>>,
    /// Bounds concurrent handler dispatch; `None` means unbounded.
    concurrency_limit: Option<Arc<Semaphore>>,
    /// Runs [`Provider::init`] exactly once, on whichever `GetMetadata` call
    /// gets there first.
    initialized: Arc<OnceCell<Vec<Diagnostic>>>,
}

impl<P: Provider + 'static> GrpcProviderServer<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider: Arc::new(RwLock::new(provider)),
            provider_data: Arc::new(RwLock::new(None)),
            concurrency_limit: None,
            initialized: Arc::new(OnceCell::new()),
        }
    }

    /// Like [`Self::new`], bounding concurrent handler dispatch per
    /// [`crate::server::ConcurrencyMode`]: a `workers`-sized semaphore for
    /// `Parallel`, a single permit for `Cooperative`'s serialized dispatch.
    pub fn with_concurrency(provider: P, concurrency: crate::server::ConcurrencyMode) -> Self {
        let permits = match concurrency {
            crate::server::ConcurrencyMode::Parallel { workers } => workers.max(1),
            crate::server::ConcurrencyMode::Cooperative => 1,
        };
        Self {
            concurrency_limit: Some(Arc::new(Semaphore::new(permits))),
            ..Self::new(provider)
        }
    }

    /// Runs `f` to completion under the configured concurrency limit,
    /// isolated from this call: a panic inside `f` is caught and reported as
    /// [`TfplugError::HandlerFailure`] rather than unwinding into the RPC
    /// dispatch and taking the connection down with it.
    async fn guarded<F, Fut, T>(&self, f: F) -> std::result::Result<T, TfplugError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = match &self.concurrency_limit {
            Some(sem) => Some(
                sem.clone()
                    .acquire_owned()
                    .await
                    .expect("concurrency semaphore is never closed"),
            ),
            None => None,
        };

        let handle = tokio::spawn(async move {
            let _permit = permit;
            f().await
        });

        handle.await.map_err(|join_err| {
            let message = join_err
                .try_into_panic()
                .map(panic_message)
                .unwrap_or_else(|_| "handler task was cancelled".to_string());
            TfplugError::HandlerFailure(message)
        })
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked with a non-string payload".to_string()
    }
}

/// Looks up and configures a fresh resource instance. Takes owned clones of
/// the shared state rather than `&self` so it can run inside a
/// [`GrpcProviderServer::guarded`]-spawned task.
async fn new_resource<P: Provider + 'static>(
    provider: &Arc<RwLock<P>>,
    provider_data: &Arc<RwLock<Option<Arc<dyn std::any::Any + Send + Sync>>>>,
    type_name: &str,
) -> std::result::Result<Box<dyn ResourceWithConfigure>, TfplugError> {
    let provider_guard = provider.read().await;
    let factory = provider_guard
        .resources()
        .remove(type_name)
        .ok_or_else(|| TfplugError::ResourceNotFound(type_name.to_string()))?;
    drop(provider_guard);

    let mut resource = factory();
    let data = provider_data.read().await.clone();
    resource
        .configure(
            Context::new(),
            crate::resource::ConfigureResourceRequest { provider_data: data },
        )
        .await;
    Ok(resource)
}

#[tonic::async_trait]
impl<P> proto::provider_server::Provider for GrpcProviderServer<P>
where
    P: Provider + 'static,
{
    async fn get_metadata(
        &self,
        _request: Request<proto::get_metadata::Request>,
    ) -> GrpcResult<Response<proto::get_metadata::Response>> {
        let provider = self.provider.clone();
        let initialized = self.initialized.clone();
        let already_initialized = initialized.initialized();

        let result = self
            .guarded(move || async move {
                let init_diagnostics = initialized
                    .get_or_init(|| async {
                        let mut diagnostics = Diagnostics::new();
                        let guard = provider.read().await;
                        guard.init(Context::new(), &mut diagnostics).await;
                        diagnostics.into_vec()
                    })
                    .await
                    .clone();

                let guard = provider.read().await;
                let provider_response = guard
                    .metadata(Context::new(), crate::provider::ProviderMetadataRequest)
                    .await;
                let resources = guard
                    .resources()
                    .keys()
                    .map(|name| proto::get_metadata::ResourceMetadata {
                        type_name: name.clone(),
                    })
                    .collect::<Vec<_>>();

                (init_diagnostics, provider_response, resources)
            })
            .await;

        match result {
            Ok((init_diagnostics, provider_response, resources)) => {
                // init() ran at most once; only the call that triggered it
                // surfaces its diagnostics.
                let diagnostics = if already_initialized { Vec::new() } else { init_diagnostics };
                Ok(Response::new(proto::get_metadata::Response {
                    server_capabilities: Some(convert_get_metadata_server_capabilities(
                        &provider_response.server_capabilities,
                    )),
                    diagnostics: convert_diagnostics(&diagnostics),
                    resources,
                }))
            }
            Err(e) => Ok(Response::new(proto::get_metadata::Response {
                server_capabilities: None,
                diagnostics: single_error_diagnostics(&e),
                resources: vec![],
            })),
        }
    }

    async fn get_provider_schema(
        &self,
        _request: Request<proto::get_provider_schema::Request>,
    ) -> GrpcResult<Response<proto::get_provider_schema::Response>> {
        let provider = self.provider.clone();
        let result = self
            .guarded(move || async move {
                let ctx = Context::new();
                let guard = provider.read().await;
                let schema_response = guard.schema(ctx.clone(), crate::provider::ProviderSchemaRequest).await;
                let mut diagnostics = schema_response.diagnostics;

                let mut resource_schemas = std::collections::HashMap::new();
                for (name, factory) in guard.resources() {
                    let resource = factory();
                    let resp = resource.schema(ctx.clone(), crate::resource::ResourceSchemaRequest).await;
                    diagnostics.extend(resp.diagnostics);
                    resource_schemas.insert(name, resp.schema);
                }

                (schema_response.schema, resource_schemas, diagnostics)
            })
            .await;

        match result {
            Ok((schema, resource_schemas, diagnostics)) => {
                Ok(Response::new(proto::get_provider_schema::Response {
                    provider: Some(convert_schema(&schema)),
                    resource_schemas: resource_schemas
                        .iter()
                        .map(|(name, schema)| (name.clone(), convert_schema(schema)))
                        .collect(),
                    diagnostics: convert_diagnostics(&diagnostics),
                    server_capabilities: Some(proto::ServerCapabilities {
                        plan_destroy: false,
                        get_provider_schema_optional: false,
                        move_resource_state: false,
                    }),
                }))
            }
            Err(e) => Ok(Response::new(proto::get_provider_schema::Response {
                provider: None,
                resource_schemas: std::collections::HashMap::new(),
                diagnostics: single_error_diagnostics(&e),
                server_capabilities: None,
            })),
        }
    }

    async fn validate_provider_config(
        &self,
        request: Request<proto::validate_provider_config::Request>,
    ) -> GrpcResult<Response<proto::validate_provider_config::Response>> {
        let req = request.into_inner();
        let config = decode_dynamic(req.config)?;

        let provider = self.provider.clone();
        let result = self
            .guarded(move || async move {
                let guard = provider.read().await;
                guard
                    .validate(
                        Context::new(),
                        crate::provider::ValidateProviderConfigRequest { config },
                    )
                    .await
            })
            .await;

        match result {
            Ok(response) => Ok(Response::new(proto::validate_provider_config::Response {
                diagnostics: convert_diagnostics(&response.diagnostics),
            })),
            Err(e) => Ok(Response::new(proto::validate_provider_config::Response {
                diagnostics: single_error_diagnostics(&e),
            })),
        }
    }

    async fn configure_provider(
        &self,
        request: Request<proto::configure_provider::Request>,
    ) -> GrpcResult<Response<proto::configure_provider::Response>> {
        let req = request.into_inner();
        let config = decode_dynamic(req.config)?;

        let provider = self.provider.clone();
        let provider_data = self.provider_data.clone();
        let result = self
            .guarded(move || async move {
                let mut guard = provider.write().await;
                let response = guard
                    .configure(
                        Context::new(),
                        crate::provider::ConfigureProviderRequest {
                            terraform_version: req.terraform_version,
                            config,
                        },
                    )
                    .await;
                drop(guard);

                *provider_data.write().await = response.provider_data;
                response.diagnostics
            })
            .await;

        match result {
            Ok(diagnostics) => Ok(Response::new(proto::configure_provider::Response {
                diagnostics: convert_diagnostics(&diagnostics),
            })),
            Err(e) => Ok(Response::new(proto::configure_provider::Response {
                diagnostics: single_error_diagnostics(&e),
            })),
        }
    }

    async fn validate_resource_config(
        &self,
        request: Request<proto::validate_resource_config::Request>,
    ) -> GrpcResult<Response<proto::validate_resource_config::Response>> {
        let req = request.into_inner();
        let config = decode_dynamic(req.config)?;
        let type_name = req.type_name;

        let provider = self.provider.clone();
        let provider_data = self.provider_data.clone();
        let result = self
            .guarded(move || async move {
                let resource = new_resource(&provider, &provider_data, &type_name).await?;
                let response = resource
                    .validate(
                        Context::new(),
                        crate::resource::ValidateResourceConfigRequest { type_name, config },
                    )
                    .await;
                Ok::<_, TfplugError>(response.diagnostics)
            })
            .await;

        match result {
            Ok(Ok(diagnostics)) => Ok(Response::new(proto::validate_resource_config::Response {
                diagnostics: convert_diagnostics(&diagnostics),
            })),
            Ok(Err(e)) => protocol_violation(e),
            Err(e) => Ok(Response::new(proto::validate_resource_config::Response {
                diagnostics: single_error_diagnostics(&e),
            })),
        }
    }

    async fn plan_resource_change(
        &self,
        request: Request<proto::plan_resource_change::Request>,
    ) -> GrpcResult<Response<proto::plan_resource_change::Response>> {
        let req = request.into_inner();
        let prior_state = decode_dynamic(req.prior_state)?;
        let proposed_new_state = decode_dynamic(req.proposed_new_state)?;
        let config = decode_dynamic(req.config)?;
        let type_name = req.type_name;
        let prior_private = req.prior_private;

        let provider = self.provider.clone();
        let provider_data = self.provider_data.clone();
        let result = self
            .guarded(move || async move {
                let resource = new_resource(&provider, &provider_data, &type_name).await?;

                // Resource destroy is signaled by a null proposed_new_state;
                // pass it through to the configured resource's own plan for
                // replace detection.
                let mut diagnostics = Vec::new();
                let mut planned_state = proposed_new_state.clone();
                let mut requires_replace = Vec::new();
                let mut planned_private = prior_private.clone();

                if let Some(modify_plan) = resource.as_modify_plan() {
                    let response = modify_plan
                        .modify_plan(
                            Context::new(),
                            crate::resource::ModifyPlanRequest {
                                type_name,
                                config,
                                prior_state,
                                proposed_new_state,
                                prior_private,
                            },
                        )
                        .await;
                    planned_state = response.planned_state;
                    requires_replace = response.requires_replace;
                    planned_private = response.planned_private;
                    diagnostics = response.diagnostics;
                }

                Ok::<_, TfplugError>((planned_state, requires_replace, planned_private, diagnostics))
            })
            .await;

        match result {
            Ok(Ok((planned_state, requires_replace, planned_private, diagnostics))) => {
                Ok(Response::new(proto::plan_resource_change::Response {
                    planned_state: Some(encode_dynamic(&planned_state)),
                    requires_replace: requires_replace.iter().map(convert_attribute_path).collect(),
                    planned_private,
                    diagnostics: convert_diagnostics(&diagnostics),
                }))
            }
            Ok(Err(e)) => protocol_violation(e),
            Err(e) => Ok(Response::new(proto::plan_resource_change::Response {
                planned_state: None,
                requires_replace: vec![],
                planned_private: vec![],
                diagnostics: single_error_diagnostics(&e),
            })),
        }
    }

    async fn apply_resource_change(
        &self,
        request: Request<proto::apply_resource_change::Request>,
    ) -> GrpcResult<Response<proto::apply_resource_change::Response>> {
        let req = request.into_inner();
        let prior_state = decode_dynamic(req.prior_state)?;
        let planned_state = decode_dynamic(req.planned_state)?;
        let config = decode_dynamic(req.config)?;
        let type_name = req.type_name;
        let planned_private = req.planned_private;

        let provider = self.provider.clone();
        let provider_data = self.provider_data.clone();
        let result = self
            .guarded(move || async move {
                let resource = new_resource(&provider, &provider_data, &type_name).await?;
                let destroying = planned_state.is_null();

                if destroying {
                    let response = resource
                        .delete(
                            Context::new(),
                            crate::resource::DeleteResourceRequest {
                                type_name,
                                prior_state,
                                planned_private,
                            },
                        )
                        .await;
                    return Ok::<_, TfplugError>((DynamicValue::null(), vec![], response.diagnostics));
                }

                if prior_state.is_null() {
                    let response = resource
                        .create(
                            Context::new(),
                            crate::resource::CreateResourceRequest {
                                type_name,
                                planned_state,
                                config,
                                planned_private,
                            },
                        )
                        .await;
                    return Ok((response.new_state, response.private, response.diagnostics));
                }

                let response = resource
                    .update(
                        Context::new(),
                        crate::resource::UpdateResourceRequest {
                            type_name,
                            prior_state,
                            planned_state,
                            config,
                            planned_private,
                        },
                    )
                    .await;
                Ok((response.new_state, response.private, response.diagnostics))
            })
            .await;

        match result {
            Ok(Ok((new_state, private, diagnostics))) => {
                Ok(Response::new(proto::apply_resource_change::Response {
                    new_state: Some(encode_dynamic(&new_state)),
                    private,
                    diagnostics: convert_diagnostics(&diagnostics),
                }))
            }
            Ok(Err(e)) => protocol_violation(e),
            Err(e) => Ok(Response::new(proto::apply_resource_change::Response {
                new_state: None,
                private: vec![],
                diagnostics: single_error_diagnostics(&e),
            })),
        }
    }

    async fn read_resource(
        &self,
        request: Request<proto::read_resource::Request>,
    ) -> GrpcResult<Response<proto::read_resource::Response>> {
        let req = request.into_inner();
        let current_state = decode_dynamic(req.current_state)?;
        let type_name = req.type_name;
        let private = req.private;

        let provider = self.provider.clone();
        let provider_data = self.provider_data.clone();
        let result = self
            .guarded(move || async move {
                let resource = new_resource(&provider, &provider_data, &type_name).await?;
                let response = resource
                    .read(
                        Context::new(),
                        crate::resource::ReadResourceRequest { type_name, current_state, private },
                    )
                    .await;
                let new_state = response.new_state.unwrap_or_else(DynamicValue::null);
                Ok::<_, TfplugError>((new_state, response.private, response.diagnostics))
            })
            .await;

        match result {
            Ok(Ok((new_state, private, diagnostics))) => Ok(Response::new(proto::read_resource::Response {
                new_state: Some(encode_dynamic(&new_state)),
                diagnostics: convert_diagnostics(&diagnostics),
                private,
            })),
            Ok(Err(e)) => protocol_violation(e),
            Err(e) => Ok(Response::new(proto::read_resource::Response {
                new_state: None,
                diagnostics: single_error_diagnostics(&e),
                private: vec![],
            })),
        }
    }

    async fn upgrade_resource_state(
        &self,
        request: Request<proto::upgrade_resource_state::Request>,
    ) -> GrpcResult<Response<proto::upgrade_resource_state::Response>> {
        let req = request.into_inner();
        let type_name = req.type_name;
        let version = req.version;
        let raw_state = RawState {
            json: req.raw_state.as_ref().map(|rs| rs.json.clone()),
            flatmap: req.raw_state.map(|rs| rs.flatmap),
        };

        let provider = self.provider.clone();
        let provider_data = self.provider_data.clone();
        let result = self
            .guarded(move || async move {
                let resource = new_resource(&provider, &provider_data, &type_name).await?;

                let (upgraded_state, diagnostics) = match resource.as_upgrade_state() {
                    Some(upgrader) => {
                        let response = upgrader
                            .upgrade_state(
                                Context::new(),
                                crate::resource::UpgradeResourceStateRequest { type_name, version, raw_state },
                            )
                            .await;
                        (response.upgraded_state, response.diagnostics)
                    }
                    None => match raw_state.decode() {
                        Ok(state) => (state, vec![]),
                        Err(e) => (
                            DynamicValue::null(),
                            vec![Diagnostic::error(
                                "Unable to upgrade resource state",
                                format!(
                                    "resource does not implement state upgrade and the stored state \
                                     could not be decoded as-is: {e}"
                                ),
                            )],
                        ),
                    },
                };
                Ok::<_, TfplugError>((upgraded_state, diagnostics))
            })
            .await;

        match result {
            Ok(Ok((upgraded_state, diagnostics))) => {
                Ok(Response::new(proto::upgrade_resource_state::Response {
                    upgraded_state: Some(encode_dynamic(&upgraded_state)),
                    diagnostics: convert_diagnostics(&diagnostics),
                }))
            }
            Ok(Err(e)) => protocol_violation(e),
            Err(e) => Ok(Response::new(proto::upgrade_resource_state::Response {
                upgraded_state: None,
                diagnostics: single_error_diagnostics(&e),
            })),
        }
    }

    async fn import_resource_state(
        &self,
        request: Request<proto::import_resource_state::Request>,
    ) -> GrpcResult<Response<proto::import_resource_state::Response>> {
        let req = request.into_inner();
        let type_name = req.type_name;
        let id = req.id;

        let provider = self.provider.clone();
        let provider_data = self.provider_data.clone();
        let result = self
            .guarded(move || async move {
                let resource = new_resource(&provider, &provider_data, &type_name).await?;

                let (imported_resources, diagnostics) = match resource.as_import_state() {
                    Some(importer) => {
                        let response = importer
                            .import_state(
                                Context::new(),
                                crate::resource::ImportResourceStateRequest { type_name, id },
                            )
                            .await;
                        (response.imported_resources, response.diagnostics)
                    }
                    None => (
                        vec![],
                        vec![Diagnostic::error(
                            "Import not supported",
                            format!("resource {type_name} does not support import"),
                        )],
                    ),
                };
                Ok::<_, TfplugError>((imported_resources, diagnostics))
            })
            .await;

        match result {
            Ok(Ok((imported_resources, diagnostics))) => {
                Ok(Response::new(proto::import_resource_state::Response {
                    imported_resources: imported_resources
                        .iter()
                        .map(|r| proto::import_resource_state::ImportedResource {
                            type_name: r.type_name.clone(),
                            state: Some(encode_dynamic(&r.state)),
                            private: r.private.clone(),
                        })
                        .collect(),
                    diagnostics: convert_diagnostics(&diagnostics),
                }))
            }
            Ok(Err(e)) => protocol_violation(e),
            Err(e) => Ok(Response::new(proto::import_resource_state::Response {
                imported_resources: vec![],
                diagnostics: single_error_diagnostics(&e),
            })),
        }
    }

    async fn stop_provider(
        &self,
        _request: Request<proto::stop_provider::Request>,
    ) -> GrpcResult<Response<proto::stop_provider::Response>> {
        let provider = self.provider.clone();
        let result = self
            .guarded(move || async move {
                let guard = provider.read().await;
                guard.stop(Context::new(), crate::provider::StopProviderRequest).await
            })
            .await;

        match result {
            Ok(response) => Ok(Response::new(proto::stop_provider::Response {
                error: response.error.unwrap_or_default(),
            })),
            Err(e) => Ok(Response::new(proto::stop_provider::Response { error: e.to_string() })),
        }
    }
}

fn protocol_violation<T>(err: TfplugError) -> GrpcResult<Response<T>> {
    Err(Status::invalid_argument(err.to_string()))
}

/// Builds the diagnostics list for a caught [`TfplugError::HandlerFailure`]
/// (or any other guarded-dispatch failure): exactly one error, per §8.
fn single_error_diagnostics(err: &TfplugError) -> Vec<proto::Diagnostic> {
    vec![convert_diagnostic(&Diagnostic::error(
        "Provider handler failed",
        err.to_string(),
    ))]
}

fn decode_dynamic(value: Option<proto::DynamicValue>) -> GrpcResult<DynamicValue> {
    let (msgpack, json) = match &value {
        Some(v) => (v.msgpack.as_slice(), v.json.as_slice()),
        None => (&[][..], &[][..]),
    };
    DynamicValue::decode_preferring_msgpack(msgpack, json)
        .map_err(|e| Status::invalid_argument(format!("malformed dynamic value: {e}")))
}

fn encode_dynamic(value: &DynamicValue) -> proto::DynamicValue {
    proto::DynamicValue {
        msgpack: value.encode_msgpack().unwrap_or_default(),
        json: vec![],
    }
}

fn convert_diagnostics(diagnostics: &[Diagnostic]) -> Vec<proto::Diagnostic> {
    diagnostics.iter().map(convert_diagnostic).collect()
}

fn convert_diagnostic(d: &Diagnostic) -> proto::Diagnostic {
    proto::Diagnostic {
        severity: convert_diagnostic_severity(d.severity) as i32,
        summary: d.summary.clone(),
        detail: d.detail.clone(),
        attribute: d.attribute.as_ref().map(convert_attribute_path),
    }
}

fn convert_diagnostic_severity(severity: DiagnosticSeverity) -> proto::diagnostic::Severity {
    match severity {
        DiagnosticSeverity::Invalid => proto::diagnostic::Severity::Invalid,
        DiagnosticSeverity::Error => proto::diagnostic::Severity::Error,
        DiagnosticSeverity::Warning => proto::diagnostic::Severity::Warning,
    }
}

fn convert_attribute_path(path: &AttributePath) -> proto::AttributePath {
    proto::AttributePath {
        steps: path.steps.iter().map(convert_attribute_path_step).collect(),
    }
}

fn convert_attribute_path_step(step: &AttributePathStep) -> proto::attribute_path::Step {
    use proto::attribute_path::step::Selector;
    let selector = match step {
        AttributePathStep::AttributeName(name) => Selector::AttributeName(name.clone()),
        AttributePathStep::ElementKeyString(key) => Selector::ElementKeyString(key.clone()),
        AttributePathStep::ElementKeyInt(idx) => Selector::ElementKeyInt(*idx),
    };
    proto::attribute_path::Step {
        selector: Some(selector),
    }
}

fn convert_get_metadata_server_capabilities(
    caps: &crate::types::ServerCapabilities,
) -> proto::get_metadata::ServerCapabilities {
    proto::get_metadata::ServerCapabilities {
        plan_destroy: caps.plan_destroy,
        get_provider_schema_optional: caps.get_provider_schema_optional,
        move_resource_state: caps.move_resource_state,
    }
}

fn convert_schema(schema: &Schema) -> proto::Schema {
    proto::Schema {
        version: schema.version,
        block: Some(convert_block(&schema.block)),
    }
}

fn convert_block(block: &Block) -> proto::schema::Block {
    proto::schema::Block {
        version: block.version,
        attributes: block.attributes.iter().map(convert_attribute).collect(),
        block_types: block.block_types.iter().map(convert_nested_block).collect(),
        description: block.description.clone(),
        description_kind: convert_string_kind(block.description_kind) as i32,
        deprecated: block.deprecated,
    }
}

fn convert_attribute(attr: &Attribute) -> proto::schema::Attribute {
    proto::schema::Attribute {
        name: attr.name.clone(),
        r#type: attr.r#type.serialize_type().unwrap_or_default(),
        nested_type: attr.nested_type.as_ref().map(convert_nested_type),
        description: attr.description.clone(),
        required: attr.required,
        optional: attr.optional,
        computed: attr.computed,
        sensitive: attr.sensitive,
        description_kind: convert_string_kind(attr.description_kind) as i32,
        deprecated: attr.deprecated,
        write_only: false,
    }
}

fn convert_nested_type(nested: &NestedType) -> proto::schema::Object {
    proto::schema::Object {
        attributes: nested.attributes.iter().map(convert_attribute).collect(),
        nesting: convert_object_nesting_mode(nested.nesting) as i32,
        min_items: 0,
        max_items: 0,
    }
}

fn convert_nested_block(block: &NestedBlock) -> proto::schema::NestedBlock {
    proto::schema::NestedBlock {
        type_name: block.type_name.clone(),
        block: Some(convert_block(&block.block)),
        nesting: convert_nesting_mode(block.nesting) as i32,
        min_items: block.min_items,
        max_items: block.max_items,
    }
}

fn convert_string_kind(kind: StringKind) -> proto::StringKind {
    match kind {
        StringKind::Plain => proto::StringKind::Plain,
        StringKind::Markdown => proto::StringKind::Markdown,
    }
}

fn convert_nesting_mode(mode: NestingMode) -> proto::schema::nested_block::NestingMode {
    use proto::schema::nested_block::NestingMode as Proto;
    match mode {
        NestingMode::Invalid => Proto::Invalid,
        NestingMode::Single => Proto::Single,
        NestingMode::List => Proto::List,
        NestingMode::Set => Proto::Set,
        NestingMode::Map => Proto::Map,
        NestingMode::Group => Proto::Group,
    }
}

fn convert_object_nesting_mode(mode: ObjectNestingMode) -> proto::schema::object::NestingMode {
    use proto::schema::object::NestingMode as Proto;
    match mode {
        ObjectNestingMode::Invalid => Proto::Invalid,
        ObjectNestingMode::Single => Proto::Single,
        ObjectNestingMode::List => Proto::List,
        ObjectNestingMode::Set => Proto::Set,
        ObjectNestingMode::Map => Proto::Map,
    }
}

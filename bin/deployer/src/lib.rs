//! Deployment of the reality.eth home/foreign proxy pair.
//!
//! Each step is gated by the network it targets, skipped if its contract is already
//! recorded, and otherwise resolves its dependencies from the network's deployment store,
//! assembles the constructor arguments and submits the creation transaction.

pub mod config;
pub mod metrics;

use crate::metrics::Metrics;
use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolConstructor;
use binding::proxy::{arbitrator_extra_data, RealitioForeignProxyLZ, RealitioHomeProxyLZ};
use ::config::{DeploymentProfile, NetworkDescriptor, NetworkError, NetworkRegistry};
use deployment::{
    should_skip, ConstructorArg, DeployRequest, DeploymentRecord, DeploymentStore, ResolveError,
    Resolver, StoreError, SubmitError, Submitter,
};
use std::{collections::BTreeMap, time::Instant};
use template::{render_mapping, render_template, TemplateRenderError};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Logical names of the contracts the proxies depend on.
pub mod names {
    pub const ENDPOINT_V2: &str = "EndpointV2";
    pub const WETH: &str = "WETH";
    pub const KLEROS_CORE: &str = "klerosCore";
    pub const DISPUTE_TEMPLATE_REGISTRY: &str = "disputeTemplateRegistry";

    pub const HOME_PROXY: &str = "RealitioHomeProxyLZ";
    pub const FOREIGN_PROXY: &str = "RealitioForeignProxyLZ";
}

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error(transparent)]
    UnknownNetwork(#[from] NetworkError),

    #[error(transparent)]
    DependencyNotDeployed(#[from] ResolveError),

    #[error("failed to render dispute template: {0}")]
    TemplateRender(#[from] TemplateRenderError),

    #[error("step `{step}` failed to deploy: {source}")]
    SubmitFailure {
        step: String,
        #[source]
        source: SubmitError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Step selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Tag {
    Home,
    Foreign,
}

/// One deployment step, derived from the profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub tag: Tag,
    pub logical_name: &'static str,
    /// The only network this step deploys to
    pub network: String,
}

impl Step {
    /// Steps of `profile`, home first.
    pub fn from_profile(profile: &DeploymentProfile) -> [Self; 2] {
        [
            Self {
                tag: Tag::Home,
                logical_name: names::HOME_PROXY,
                network: profile.home.network.clone(),
            },
            Self {
                tag: Tag::Foreign,
                logical_name: names::FOREIGN_PROXY,
                network: profile.foreign.network.clone(),
            },
        ]
    }
}

/// Positional constructor arguments of either proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyArgs {
    Home {
        realitio: Address,
        metadata: String,
        foreign_eid: u32,
        endpoint: Address,
    },
    Foreign {
        wrapped_native: Address,
        arbitrator: Address,
        arbitrator_extra_data: Bytes,
        template_registry: Address,
        template: String,
        mapping: String,
        home_eid: u32,
        endpoint: Address,
    },
}

impl ProxyArgs {
    /// The arguments in constructor order, as stored in the deployment record.
    pub fn constructor_args(&self) -> Vec<ConstructorArg> {
        match self.clone() {
            Self::Home {
                realitio,
                metadata,
                foreign_eid,
                endpoint,
            } => vec![
                realitio.into(),
                metadata.into(),
                foreign_eid.into(),
                endpoint.into(),
            ],
            Self::Foreign {
                wrapped_native,
                arbitrator,
                arbitrator_extra_data,
                template_registry,
                template,
                mapping,
                home_eid,
                endpoint,
            } => vec![
                wrapped_native.into(),
                arbitrator.into(),
                arbitrator_extra_data.into(),
                template_registry.into(),
                template.into(),
                mapping.into(),
                home_eid.into(),
                endpoint.into(),
            ],
        }
    }

    /// ABI encoding appended to the creation bytecode.
    pub fn abi_encode(&self) -> Bytes {
        match self.clone() {
            Self::Home {
                realitio,
                metadata,
                foreign_eid,
                endpoint,
            } => RealitioHomeProxyLZ::constructorCall {
                realitio,
                metadata,
                foreignEid: foreign_eid,
                endpoint,
            }
            .abi_encode()
            .into(),
            Self::Foreign {
                wrapped_native,
                arbitrator,
                arbitrator_extra_data,
                template_registry,
                template,
                mapping,
                home_eid,
                endpoint,
            } => RealitioForeignProxyLZ::constructorCall {
                wNative: wrapped_native,
                arbitrator,
                arbitratorExtraData: arbitrator_extra_data,
                templateRegistry: template_registry,
                templateData: template,
                templateDataMappings: mapping,
                homeEid: home_eid,
                endpoint,
            }
            .abi_encode()
            .into(),
        }
    }
}

/// What happened to a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Connected to a network the step does not target
    Skipped { expected: String, current: String },
    /// Recorded by an earlier run or an import
    AlreadyDeployed(DeploymentRecord),
    Deployed(DeploymentRecord),
}

impl StepOutcome {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Skipped { .. } => "skipped",
            Self::AlreadyDeployed(_) => "already_deployed",
            Self::Deployed(_) => "deployed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub logical_name: &'static str,
    pub outcome: StepOutcome,
}

/// Render the dispute template and its data mapping for the foreign proxy on `network`.
///
/// The mapping is the empty string when the profile does not supply one.
pub fn render_documents<S>(
    profile: &DeploymentProfile,
    network: &NetworkDescriptor,
    store: &S,
) -> Result<(String, String), OrchestratorError>
where
    S: DeploymentStore + ?Sized,
{
    let arbitrator = Resolver::new(store).resolve(names::KLEROS_CORE)?;
    let template = render_template(network.chain_id, arbitrator, &profile.foreign.template)?;
    let mapping = if profile.foreign.supply_mapping {
        render_mapping(profile.home.upstream_oracle)?
    } else {
        String::new()
    };
    Ok((template, mapping))
}

/// Record externally deployed contracts, leaving existing records untouched.
///
/// Returns the number of records added.
pub fn seed_external<S>(
    store: &mut S,
    external: &BTreeMap<String, Address>,
) -> Result<usize, StoreError>
where
    S: DeploymentStore + ?Sized,
{
    let mut added = 0;
    for (name, &address) in external {
        match store.get(name) {
            Some(existing) if existing.address != address => {
                warn!(
                    name,
                    recorded = %existing.address,
                    configured = %address,
                    "external address differs from the recorded one, keeping the record"
                );
            }
            Some(_) => {}
            None => {
                store.insert(DeploymentRecord::imported(name.clone(), address))?;
                debug!(name, %address, network = store.network(), "imported external deployment");
                added += 1;
            }
        }
    }
    Ok(added)
}

/// Runs the deployment steps of a profile against one network's store.
pub struct Orchestrator<'a, S, D> {
    registry: &'a NetworkRegistry,
    profile: &'a DeploymentProfile,
    store: S,
    submitter: D,
    metrics: Metrics,
}

impl<'a, S, D> Orchestrator<'a, S, D>
where
    S: DeploymentStore,
    D: Submitter,
{
    pub fn new(
        registry: &'a NetworkRegistry,
        profile: &'a DeploymentProfile,
        store: S,
        submitter: D,
    ) -> Self {
        Self {
            registry,
            profile,
            store,
            submitter,
            metrics: Metrics::new(),
        }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn submitter(&self) -> &D {
        &self.submitter
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Run the steps selected by `tags`, in declared order, on `network`.
    ///
    /// Stops at the first failing step. Steps completed before it stay recorded.
    pub async fn run(
        &mut self,
        network: &NetworkDescriptor,
        tags: &[Tag],
    ) -> Result<Vec<StepReport>, OrchestratorError> {
        let started = Instant::now();
        let steps = Step::from_profile(self.profile);

        let mut reports = Vec::new();
        for step in steps.iter().filter(|step| tags.contains(&step.tag)) {
            match self.run_step(network, step).await {
                Ok(outcome) => {
                    self.metrics.record_step_outcome(step.logical_name, outcome.label());
                    reports.push(StepReport {
                        logical_name: step.logical_name,
                        outcome,
                    });
                }
                Err(e) => {
                    self.metrics.record_step_failure(step.logical_name);
                    self.metrics.record_run(false, started.elapsed());
                    return Err(e);
                }
            }
        }

        self.metrics.record_run(true, started.elapsed());
        Ok(reports)
    }

    /// Run a single step on `network`.
    pub async fn run_step(
        &mut self,
        network: &NetworkDescriptor,
        step: &Step,
    ) -> Result<StepOutcome, OrchestratorError> {
        if should_skip(&network.name, &step.network) {
            return Ok(StepOutcome::Skipped {
                expected: step.network.clone(),
                current: network.name.clone(),
            });
        }

        if let Some(record) = self.store.get(step.logical_name) {
            info!(
                step = step.logical_name,
                address = %record.address,
                network = %network.name,
                "already deployed"
            );
            return Ok(StepOutcome::AlreadyDeployed(record.clone()));
        }

        let companion = self.registry.resolve_companion(&network.name)?;
        let args = self.assemble_args(network, step.tag, companion.endpoint_id)?;

        let request = DeployRequest {
            logical_name: step.logical_name.to_string(),
            contract: step.logical_name.to_string(),
            constructor_args: args.constructor_args(),
            encoded_args: args.abi_encode(),
        };

        info!(
            step = step.logical_name,
            network = %network.name,
            companion = %companion.name,
            companion_eid = companion.endpoint_id,
            "deploying"
        );
        let submit_started = Instant::now();
        let submission = self.submitter.submit(&request).await.map_err(|source| {
            OrchestratorError::SubmitFailure {
                step: step.logical_name.to_string(),
                source,
            }
        })?;
        self.metrics
            .record_submission(step.logical_name, submission.gas_used, submit_started.elapsed());

        let record = DeploymentRecord {
            logical_name: request.logical_name,
            address: submission.address,
            constructor_args: request.constructor_args,
            tx_hash: Some(submission.tx_hash),
            block_number: submission.block_number,
        };
        self.store.insert(record.clone())?;

        info!(
            step = step.logical_name,
            address = %record.address,
            tx_hash = %submission.tx_hash,
            gas_used = submission.gas_used,
            "deployed"
        );
        Ok(StepOutcome::Deployed(record))
    }

    fn assemble_args(
        &self,
        network: &NetworkDescriptor,
        tag: Tag,
        companion_eid: u32,
    ) -> Result<ProxyArgs, OrchestratorError> {
        let resolver = Resolver::new(&self.store);

        match tag {
            Tag::Home => {
                let endpoint = resolver.resolve(names::ENDPOINT_V2)?;
                Ok(ProxyArgs::Home {
                    realitio: self.profile.home.upstream_oracle,
                    metadata: self.profile.home.metadata.clone(),
                    foreign_eid: companion_eid,
                    endpoint,
                })
            }
            Tag::Foreign => {
                let [wrapped_native, arbitrator, template_registry, endpoint] =
                    resolver.resolve_all([
                        names::WETH,
                        names::KLEROS_CORE,
                        names::DISPUTE_TEMPLATE_REGISTRY,
                        names::ENDPOINT_V2,
                    ])?;

                let (template, mapping) = render_documents(self.profile, network, &self.store)?;
                let foreign = &self.profile.foreign;

                Ok(ProxyArgs::Foreign {
                    wrapped_native,
                    arbitrator,
                    arbitrator_extra_data: arbitrator_extra_data(
                        foreign.court_id,
                        foreign.juror_count,
                    ),
                    template_registry,
                    template,
                    mapping,
                    home_eid: companion_eid,
                    endpoint,
                })
            }
        }
    }
}

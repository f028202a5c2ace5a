use std::time::Duration;

use k8s::PodExt as _;
use k8s::WorkloadSource;
use kube::ResourceExt as _;
use kube_prune_kubeapi::KubeApi;
use tokio::time::{self, Instant};

use super::*;

/// Collects what a determination needs before anything is listed.
#[derive(Debug)]
pub struct DeterminerBuilder {
    namespace: String,
    requirements: Requirements,
    scan: Scan,
    deadline: Option<Instant>,
    timeout: Option<Duration>,
}

impl DeterminerBuilder {
    /// Start a determination for `namespace`. An empty namespace spans all
    /// namespaces the source can list.
    pub fn new(namespace: impl ToString) -> Self {
        Self {
            namespace: namespace.to_string(),
            requirements: Requirements::default(),
            scan: Scan::default(),
            deadline: None,
            timeout: None,
        }
    }

    pub fn kinds(self, kinds: impl IntoIterator<Item = Kind>) -> Self {
        let requirements = kinds
            .into_iter()
            .fold(self.requirements, Requirements::with_kind);
        Self {
            requirements,
            ..self
        }
    }

    /// Record the kinds of `candidates`. Candidates of unsupported kinds need
    /// nothing; they are rejected when a decision is asked for them.
    pub fn candidates<'a, D>(self, candidates: impl IntoIterator<Item = &'a D>) -> Self
    where
        D: ResourceDescriptor + 'a,
    {
        let kinds = candidates
            .into_iter()
            .filter_map(|candidate| candidate.kind().and_then(Kind::from_kind));
        self.kinds(kinds)
    }

    pub fn requirements(self, requirements: Requirements) -> Self {
        Self {
            requirements,
            ..self
        }
    }

    /// Choose which pod fields count as references. Defaults to
    /// [`Scan::Containers`].
    pub fn scan(self, scan: Scan) -> Self {
        Self { scan, ..self }
    }

    /// Fail any listing still in flight at `deadline`.
    pub fn deadline(self, deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..self
        }
    }

    /// Fail any listing still in flight `timeout` after [`build`](Self::build)
    /// starts. With a deadline also set, whichever comes first applies.
    pub fn timeout(self, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self
        }
    }

    /// List what the requested kinds need from `source` and build their indices.
    ///
    /// Pods are listed at most once, and only if a ConfigMap, Secret,
    /// PersistentVolumeClaim or PodDisruptionBudget is being judged. Service
    /// accounts are listed only for Secrets. The first listing failure aborts
    /// the build.
    pub async fn build<S>(self, source: &S) -> Result<Determiner>
    where
        S: WorkloadSource,
    {
        let Self {
            namespace,
            requirements,
            scan,
            deadline,
            timeout,
        } = self;
        let deadline = match (deadline, timeout.map(|timeout| Instant::now() + timeout)) {
            (Some(deadline), Some(expiry)) => Some(deadline.min(expiry)),
            (deadline, expiry) => deadline.or(expiry),
        };
        tracing::debug!(%namespace, ?requirements, ?scan, "Building prune determiner");

        let pods = if requirements.needs_pods() {
            fetch("pods", &namespace, deadline, source.list_pods(&namespace)).await?
        } else {
            Vec::new()
        };

        let service_accounts = if requirements.needs_service_accounts() {
            let list = source.list_service_accounts(&namespace);
            fetch("serviceaccounts", &namespace, deadline, list).await?
        } else {
            Vec::new()
        };

        let used_config_maps = requirements
            .config_maps
            .then(|| used_config_maps(&pods, scan));
        let used_secrets = requirements
            .secrets
            .then(|| used_secrets(&pods, &service_accounts, scan));
        let used_persistent_volume_claims = requirements
            .persistent_volume_claims
            .then(|| used_persistent_volume_claims(&pods));

        tracing::debug!(
            %namespace,
            pods = pods.len(),
            service_accounts = service_accounts.len(),
            config_maps = used_config_maps.as_ref().map(NameSet::len),
            secrets = used_secrets.as_ref().map(NameSet::len),
            persistent_volume_claims = used_persistent_volume_claims.as_ref().map(NameSet::len),
            "Built reference indices"
        );

        Ok(Determiner {
            used_config_maps,
            used_secrets,
            used_persistent_volume_claims,
            pods,
        })
    }
}

async fn fetch<T, E>(
    resource: &'static str,
    namespace: &str,
    deadline: Option<Instant>,
    list: impl Future<Output = Result<Vec<T>, E>>,
) -> Result<Vec<T>>
where
    E: std::error::Error + Send + Sync + 'static,
{
    let listed = match deadline {
        Some(deadline) => time::timeout_at(deadline, list).await.map_err(|elapsed| {
            tracing::warn!(resource, namespace, "Listing did not finish before the deadline");
            Error::fetch(resource, namespace, elapsed)
        })?,
        None => list.await,
    };
    listed.map_err(|err| Error::fetch(resource, namespace, err))
}

/// Decides, candidate by candidate, whether a resource is still in use.
///
/// Indices for kinds that were not requested at build time are absent and
/// treat every name of that kind as unused.
#[derive(Debug)]
pub struct Determiner {
    used_config_maps: Option<NameSet>,
    used_secrets: Option<NameSet>,
    used_persistent_volume_claims: Option<NameSet>,
    pods: Vec<corev1::Pod>,
}

impl Determiner {
    pub fn builder(namespace: impl ToString) -> DeterminerBuilder {
        DeterminerBuilder::new(namespace)
    }

    /// Build a determiner for `candidates` in `namespace`, listing through `source`.
    pub async fn new<'a, S, D>(
        source: &S,
        candidates: impl IntoIterator<Item = &'a D>,
        namespace: &str,
    ) -> Result<Self>
    where
        S: WorkloadSource,
        D: ResourceDescriptor + 'a,
    {
        DeterminerBuilder::new(namespace)
            .candidates(candidates)
            .build(source)
            .await
    }

    /// Build a determiner that lists pods and service accounts with `client`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn run(candidates: Vec<kube::api::DynamicObject>) -> kube_prune::Result<()> {
    /// let client = kube::Client::try_default().await.unwrap();
    /// let determiner = kube_prune::Determiner::from_client(client, &candidates, "default").await?;
    /// for candidate in &candidates {
    ///     match determiner.determine_prune(candidate) {
    ///         Ok(prune) => println!("{prune}"),
    ///         Err(err) => eprintln!("{err}"),
    ///     }
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn from_client<'a, D>(
        client: kube::Client,
        candidates: impl IntoIterator<Item = &'a D>,
        namespace: &str,
    ) -> Result<Self>
    where
        D: ResourceDescriptor + 'a,
    {
        let api = KubeApi::with_client(client);
        Self::new(&api, candidates, namespace).await
    }

    /// Whether `candidate` can be pruned.
    ///
    /// ConfigMaps, Secrets and PersistentVolumeClaims are prunable when no
    /// index entry names them. Pods are prunable when they are not running.
    /// PodDisruptionBudgets are prunable when their selector matches no pod.
    pub fn determine_prune<D>(&self, candidate: &D) -> Result<bool>
    where
        D: ResourceDescriptor,
    {
        let name = candidate.name();
        let Some(kind) = candidate.kind().and_then(Kind::from_kind) else {
            let kind = candidate.kind().unwrap_or_default().to_string();
            return Err(Error::UnsupportedKind { kind, name });
        };

        let prune = match kind {
            Kind::ConfigMap => !is_used(self.used_config_maps.as_ref(), &name),
            Kind::Secret => !is_used(self.used_secrets.as_ref(), &name),
            Kind::PersistentVolumeClaim => {
                !is_used(self.used_persistent_volume_claims.as_ref(), &name)
            }
            Kind::Pod => {
                let pod = parse::<corev1::Pod, _>(candidate, kind, &name)?;
                !pod.is_running()
            }
            Kind::PodDisruptionBudget => {
                let pdb = parse::<policyv1::PodDisruptionBudget, _>(candidate, kind, &name)?;
                !self.pod_disruption_budget_is_used(&pdb)?
            }
        };

        tracing::trace!(%kind, %name, prune, "Determined prune");
        Ok(prune)
    }

    /// Whether `pdb` selects at least one listed pod, whatever its phase.
    pub fn pod_disruption_budget_is_used(
        &self,
        pdb: &policyv1::PodDisruptionBudget,
    ) -> Result<bool> {
        let selector = pdb.spec.as_ref().and_then(|spec| spec.selector.as_ref());
        let selector = Selector::from_label_selector(selector).map_err(|source| {
            let name = pdb.name_any();
            Error::Selector { name, source }
        })?;

        Ok(self.pods.iter().any(|pod| selector.matches(pod.labels())))
    }
}

fn is_used(index: Option<&NameSet>, name: &str) -> bool {
    index.is_some_and(|index| index.contains(name))
}

fn parse<K, D>(candidate: &D, kind: Kind, name: &str) -> Result<K>
where
    K: kube::Resource + serde::de::DeserializeOwned,
    D: ResourceDescriptor,
{
    candidate.parse().map_err(|source| Error::Conversion {
        kind,
        name: name.to_string(),
        source,
    })
}

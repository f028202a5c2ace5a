use std::fmt;

use kube::api;
use kube_prune_ext as k8s;

use k8s::corev1;
use k8s::openapi::NamespaceResourceScope;

/// Lists the workloads that keep prunable resources alive, straight from the API server.
pub struct KubeApi {
    list_params: api::ListParams,
    client: kube::Client,
}

impl KubeApi {
    /// Create a KubeApi configured with the default Kubernetes client.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn run() -> Result<(), kube::Error> {
    /// let api = kube_prune_kubeapi::KubeApi::new().await?;
    /// let pods = api.list_pods("default").await?;
    /// println!("{} pods in default", pods.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new() -> kube::Result<Self> {
        kube::Client::try_default().await.map(Self::with_client)
    }

    /// Create a KubeApi backed by the provided Kubernetes client.
    ///
    /// The returned KubeApi lists with default `ListParams`.
    pub fn with_client(client: kube::Client) -> Self {
        Self {
            list_params: api::ListParams::default(),
            client,
        }
    }

    /// Replace the `ListParams` used for every list request.
    pub fn with_list_params(self, list_params: api::ListParams) -> Self {
        Self {
            list_params,
            ..self
        }
    }

    /// Lists every Pod in `namespace`, or in all namespaces when `namespace` is empty.
    ///
    /// Pods are returned regardless of their phase.
    pub async fn list_pods(&self, namespace: &str) -> kube::Result<Vec<corev1::Pod>> {
        let lp = self.list_params();
        self.api::<corev1::Pod>(namespace)
            .list(lp)
            .await
            .map(|list| list.items)
            .inspect(|pods| tracing::debug!(namespace, count = pods.len(), "Listed pods"))
            .inspect_err(|err| tracing::warn!(namespace, ?err, "Failed to list pods"))
    }

    /// Lists every ServiceAccount in `namespace`, or in all namespaces when `namespace` is empty.
    pub async fn list_service_accounts(
        &self,
        namespace: &str,
    ) -> kube::Result<Vec<corev1::ServiceAccount>> {
        let lp = self.list_params();
        self.api::<corev1::ServiceAccount>(namespace)
            .list(lp)
            .await
            .map(|list| list.items)
            .inspect(|sas| tracing::debug!(namespace, count = sas.len(), "Listed service accounts"))
            .inspect_err(|err| tracing::warn!(namespace, ?err, "Failed to list service accounts"))
    }

    fn api<K>(&self, namespace: &str) -> api::Api<K>
    where
        K: kube::Resource<Scope = NamespaceResourceScope>,
        K::DynamicType: Default,
    {
        if namespace.is_empty() {
            api::Api::all(self.client.clone())
        } else {
            api::Api::namespaced(self.client.clone(), namespace)
        }
    }

    fn list_params(&self) -> &api::ListParams {
        &self.list_params
    }
}

impl k8s::WorkloadSource for KubeApi {
    type Error = kube::Error;

    fn list_pods(
        &self,
        namespace: &str,
    ) -> impl Future<Output = kube::Result<Vec<corev1::Pod>>> + Send {
        Self::list_pods(self, namespace)
    }

    fn list_service_accounts(
        &self,
        namespace: &str,
    ) -> impl Future<Output = kube::Result<Vec<corev1::ServiceAccount>>> + Send {
        Self::list_service_accounts(self, namespace)
    }
}

impl fmt::Debug for KubeApi {
    /// Formats the `KubeApi` for debugging, redacting the `client`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubeApi")
            .field("list_params", &self.list_params)
            .field("client", &"<kube::Client>")
            .finish()
    }
}

pub use k8s_openapi as openapi;
pub use k8s_openapi::api::core::v1 as corev1;
pub use k8s_openapi::api::policy::v1 as policyv1;
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;

pub use pod::ContainerExt;
pub use pod::POD_RUNNING;
pub use pod::PodExt;
pub use pod::VolumeExt;
pub use service_account::ServiceAccountExt;
pub use source::WorkloadSource;

mod pod;
mod service_account;
mod source;

pub trait ObjectMetaExt {
    fn new(name: impl ToString) -> Self;
    fn with_namespace(name: impl ToString, namespace: impl ToString) -> Self;
    fn labels<K, V>(self, labels: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: ToString,
        V: ToString;
}

impl ObjectMetaExt for metav1::ObjectMeta {
    fn new(name: impl ToString) -> Self {
        let name = Some(name.to_string());
        Self { name, ..default() }
    }

    fn with_namespace(name: impl ToString, namespace: impl ToString) -> Self {
        Self {
            namespace: Some(namespace.to_string()),
            ..Self::new(name)
        }
    }

    /// Replace the labels with the given key/value pairs.
    ///
    /// # Examples
    ///
    /// ```
    /// # use kube_prune_ext::{metav1, ObjectMetaExt as _};
    /// let metadata = metav1::ObjectMeta::new("web-0").labels([("app", "web")]);
    /// assert_eq!(metadata.labels.unwrap()["app"], "web");
    /// ```
    fn labels<K, V>(self, labels: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: ToString,
        V: ToString,
    {
        let labels = labels
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Self {
            labels: Some(labels),
            ..self
        }
    }
}

pub fn default<T: Default>() -> T {
    T::default()
}

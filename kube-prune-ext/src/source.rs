use std::error::Error;

use super::*;

/// Lists the workload objects whose references keep other resources alive.
///
/// Both calls are made at most once per determination. An empty `namespace`
/// means every namespace the caller can see.
pub trait WorkloadSource {
    type Error: Error + Send + Sync + 'static;

    fn list_pods(
        &self,
        namespace: &str,
    ) -> impl Future<Output = Result<Vec<corev1::Pod>, Self::Error>> + Send;

    fn list_service_accounts(
        &self,
        namespace: &str,
    ) -> impl Future<Output = Result<Vec<corev1::ServiceAccount>, Self::Error>> + Send;
}

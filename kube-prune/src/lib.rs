//! Liveness determination for prunable namespaced resources.
//!
//! A [`Determiner`] is built once per pruning run from the kinds of the
//! candidates being considered. It lists pods (and service accounts, when
//! Secrets are among the candidates) exactly once, builds the reference
//! indices those kinds need, and then answers [`Determiner::determine_prune`]
//! for each candidate without touching the cluster again.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use kube_prune_ext as k8s;

use k8s::corev1;
use k8s::metav1;
use k8s::policyv1;

pub use descriptor::BoxError;
pub use descriptor::ResourceDescriptor;
pub use determiner::Determiner;
pub use determiner::DeterminerBuilder;
pub use error::Error;
pub use error::Result;
pub use index::NameSet;
pub use index::Scan;
pub use index::used_config_maps;
pub use index::used_persistent_volume_claims;
pub use index::used_secrets;
pub use kind::Kind;
pub use kind::Requirements;
pub use selector::Operator;
pub use selector::Requirement;
pub use selector::Selector;
pub use selector::SelectorError;

mod descriptor;
mod determiner;
mod error;
mod index;
mod kind;
mod selector;

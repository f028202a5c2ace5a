use std::fmt;

use k8s::openapi::Resource as _;

use super::*;

/// The resource kinds a [`Determiner`] knows how to judge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    ConfigMap,
    Secret,
    PersistentVolumeClaim,
    Pod,
    PodDisruptionBudget,
}

impl Kind {
    pub const ALL: [Self; 5] = [
        Self::ConfigMap,
        Self::Secret,
        Self::PersistentVolumeClaim,
        Self::Pod,
        Self::PodDisruptionBudget,
    ];

    /// Look up a kind by its API `kind` string. Matching is exact.
    pub fn from_kind(kind: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|known| known.as_str() == kind)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConfigMap => corev1::ConfigMap::KIND,
            Self::Secret => corev1::Secret::KIND,
            Self::PersistentVolumeClaim => corev1::PersistentVolumeClaim::KIND,
            Self::Pod => corev1::Pod::KIND,
            Self::PodDisruptionBudget => policyv1::PodDisruptionBudget::KIND,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which reference indices a determination has to build.
///
/// Pods carry no flag: judging a pod only looks at the pod itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Requirements {
    pub config_maps: bool,
    pub secrets: bool,
    pub persistent_volume_claims: bool,
    pub pod_disruption_budgets: bool,
}

impl Requirements {
    pub fn with_kind(self, kind: Kind) -> Self {
        match kind {
            Kind::ConfigMap => Self {
                config_maps: true,
                ..self
            },
            Kind::Secret => Self {
                secrets: true,
                ..self
            },
            Kind::PersistentVolumeClaim => Self {
                persistent_volume_claims: true,
                ..self
            },
            Kind::PodDisruptionBudget => Self {
                pod_disruption_budgets: true,
                ..self
            },
            Kind::Pod => self,
        }
    }

    pub fn needs_pods(&self) -> bool {
        self.config_maps
            || self.secrets
            || self.persistent_volume_claims
            || self.pod_disruption_budgets
    }

    pub fn needs_service_accounts(&self) -> bool {
        self.secrets
    }
}

impl FromIterator<Kind> for Requirements {
    fn from_iter<T: IntoIterator<Item = Kind>>(iter: T) -> Self {
        iter.into_iter().fold(Self::default(), Self::with_kind)
    }
}

impl Extend<Kind> for Requirements {
    fn extend<T: IntoIterator<Item = Kind>>(&mut self, iter: T) {
        *self = iter.into_iter().fold(*self, Self::with_kind);
    }
}

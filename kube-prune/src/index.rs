use k8s::ContainerExt as _;
use k8s::PodExt as _;
use k8s::ServiceAccountExt as _;
use k8s::VolumeExt as _;

use super::*;

/// Names of resources that something still references.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameSet(BTreeSet<String>);

impl NameSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `name` was not present before.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.0.insert(name.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for NameSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for NameSet {
    fn extend<T: IntoIterator<Item = S>>(&mut self, iter: T) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

/// Which parts of a pod count as references.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Scan {
    /// Regular containers and volumes. Service accounts contribute their
    /// `secrets` list.
    #[default]
    Containers,
    /// Everything in [`Scan::Containers`], plus init containers and the
    /// `imagePullSecrets` of pods and service accounts.
    Extended,
}

impl Scan {
    pub fn is_extended(self) -> bool {
        self == Self::Extended
    }

    fn containers(self, pod: &corev1::Pod) -> impl Iterator<Item = &corev1::Container> {
        let init = self.is_extended().then(|| pod.init_containers());
        pod.containers().chain(init.into_iter().flatten())
    }

    fn image_pull_secrets(self, pod: &corev1::Pod) -> impl Iterator<Item = &str> {
        let secrets = self.is_extended().then(|| pod.image_pull_secrets());
        secrets.into_iter().flatten()
    }
}

/// ConfigMaps referenced by env, envFrom, ConfigMap volumes or projected
/// volume sources of any pod.
pub fn used_config_maps<'a>(
    pods: impl IntoIterator<Item = &'a corev1::Pod>,
    scan: Scan,
) -> NameSet {
    pods.into_iter()
        .flat_map(|pod| config_map_references(pod, scan))
        .collect()
}

/// Secrets referenced by any pod, plus every Secret a service account lists.
pub fn used_secrets<'a>(
    pods: impl IntoIterator<Item = &'a corev1::Pod>,
    service_accounts: impl IntoIterator<Item = &'a corev1::ServiceAccount>,
    scan: Scan,
) -> NameSet {
    let mut secrets = pods
        .into_iter()
        .flat_map(|pod| secret_references(pod, scan))
        .collect::<NameSet>();
    for service_account in service_accounts {
        secrets.extend(service_account.secret_names());
        if scan.is_extended() {
            secrets.extend(service_account.image_pull_secret_names());
        }
    }
    secrets
}

pub fn used_persistent_volume_claims<'a>(
    pods: impl IntoIterator<Item = &'a corev1::Pod>,
) -> NameSet {
    pods.into_iter()
        .flat_map(|pod| pod.volumes())
        .filter_map(|volume| volume.persistent_volume_claim.as_ref())
        .map(|claim| claim.claim_name.as_str())
        .collect()
}

fn config_map_references(pod: &corev1::Pod, scan: Scan) -> impl Iterator<Item = &str> {
    let containers = scan.containers(pod).flat_map(|container| {
        let env_from = container
            .env_from()
            .filter_map(|source| source.config_map_ref.as_ref())
            .map(|config_map| config_map.name.as_str());
        let env = container
            .env_value_sources()
            .filter_map(|source| source.config_map_key_ref.as_ref())
            .map(|selector| selector.name.as_str());
        env_from.chain(env)
    });

    let volumes = pod.volumes().flat_map(|volume| {
        let direct = volume
            .config_map
            .iter()
            .map(|config_map| config_map.name.as_str());
        let projected = volume
            .projections()
            .filter_map(|projection| projection.config_map.as_ref())
            .map(|config_map| config_map.name.as_str());
        direct.chain(projected)
    });

    containers.chain(volumes)
}

fn secret_references(pod: &corev1::Pod, scan: Scan) -> impl Iterator<Item = &str> {
    let containers = scan.containers(pod).flat_map(|container| {
        let env_from = container
            .env_from()
            .filter_map(|source| source.secret_ref.as_ref())
            .map(|secret| secret.name.as_str());
        let env = container
            .env_value_sources()
            .filter_map(|source| source.secret_key_ref.as_ref())
            .map(|selector| selector.name.as_str());
        env_from.chain(env)
    });

    let volumes = pod.volumes().flat_map(|volume| {
        let direct = volume
            .secret
            .iter()
            .filter_map(|secret| secret.secret_name.as_deref());
        let projected = volume
            .projections()
            .filter_map(|projection| projection.secret.as_ref())
            .map(|secret| secret.name.as_str());
        direct.chain(projected)
    });

    containers
        .chain(volumes)
        .chain(scan.image_pull_secrets(pod))
}

#[cfg(test)]
mod tests {
    use k8s::ObjectMetaExt as _;

    use super::*;

    const NO_PODS: &[corev1::Pod] = &[];
    const NO_SERVICE_ACCOUNTS: &[corev1::ServiceAccount] = &[];

    fn pod(spec: corev1::PodSpec) -> corev1::Pod {
        corev1::Pod {
            metadata: metav1::ObjectMeta::with_namespace("web-0", "default"),
            spec: Some(spec),
            ..k8s::default()
        }
    }

    fn container(
        env_from: Vec<corev1::EnvFromSource>,
        env: Vec<corev1::EnvVarSource>,
    ) -> corev1::Container {
        let env = env
            .into_iter()
            .map(|source| corev1::EnvVar {
                name: "VALUE".to_string(),
                value_from: Some(source),
                ..k8s::default()
            })
            .collect();
        corev1::Container {
            name: "app".to_string(),
            env_from: Some(env_from),
            env: Some(env),
            ..k8s::default()
        }
    }

    fn volume(name: &str, volume: corev1::Volume) -> corev1::Volume {
        corev1::Volume {
            name: name.to_string(),
            ..volume
        }
    }

    fn config_map_env_from(name: &str) -> corev1::EnvFromSource {
        corev1::EnvFromSource {
            config_map_ref: Some(corev1::ConfigMapEnvSource {
                name: name.to_string(),
                ..k8s::default()
            }),
            ..k8s::default()
        }
    }

    fn secret_env_from(name: &str) -> corev1::EnvFromSource {
        corev1::EnvFromSource {
            secret_ref: Some(corev1::SecretEnvSource {
                name: name.to_string(),
                ..k8s::default()
            }),
            ..k8s::default()
        }
    }

    fn config_map_key(name: &str) -> corev1::EnvVarSource {
        corev1::EnvVarSource {
            config_map_key_ref: Some(corev1::ConfigMapKeySelector {
                name: name.to_string(),
                key: "key".to_string(),
                ..k8s::default()
            }),
            ..k8s::default()
        }
    }

    fn secret_key(name: &str) -> corev1::EnvVarSource {
        corev1::EnvVarSource {
            secret_key_ref: Some(corev1::SecretKeySelector {
                name: name.to_string(),
                key: "key".to_string(),
                ..k8s::default()
            }),
            ..k8s::default()
        }
    }

    fn projected(sources: Vec<corev1::VolumeProjection>) -> corev1::Volume {
        corev1::Volume {
            projected: Some(corev1::ProjectedVolumeSource {
                sources: Some(sources),
                ..k8s::default()
            }),
            ..k8s::default()
        }
    }

    fn mixed_pod() -> corev1::Pod {
        pod(corev1::PodSpec {
            containers: vec![container(
                vec![config_map_env_from("env-from-cm"), secret_env_from("env-from-secret")],
                vec![config_map_key("env-cm"), secret_key("env-secret")],
            )],
            init_containers: Some(vec![container(
                vec![config_map_env_from("init-cm")],
                vec![secret_key("init-secret")],
            )]),
            volumes: Some(vec![
                volume(
                    "config",
                    corev1::Volume {
                        config_map: Some(corev1::ConfigMapVolumeSource {
                            name: "volume-cm".to_string(),
                            ..k8s::default()
                        }),
                        ..k8s::default()
                    },
                ),
                volume(
                    "credentials",
                    corev1::Volume {
                        secret: Some(corev1::SecretVolumeSource {
                            secret_name: Some("volume-secret".to_string()),
                            ..k8s::default()
                        }),
                        ..k8s::default()
                    },
                ),
                volume(
                    "bundle",
                    projected(vec![
                        corev1::VolumeProjection {
                            config_map: Some(corev1::ConfigMapProjection {
                                name: "projected-cm".to_string(),
                                ..k8s::default()
                            }),
                            ..k8s::default()
                        },
                        corev1::VolumeProjection {
                            secret: Some(corev1::SecretProjection {
                                name: "projected-secret".to_string(),
                                ..k8s::default()
                            }),
                            ..k8s::default()
                        },
                    ]),
                ),
                volume(
                    "data",
                    corev1::Volume {
                        persistent_volume_claim: Some(corev1::PersistentVolumeClaimVolumeSource {
                            claim_name: "data-web-0".to_string(),
                            ..k8s::default()
                        }),
                        ..k8s::default()
                    },
                ),
                volume("scratch", corev1::Volume::default()),
            ]),
            image_pull_secrets: Some(vec![corev1::LocalObjectReference {
                name: "registry".to_string(),
            }]),
            ..k8s::default()
        })
    }

    #[test]
    fn name_set_collapses_duplicates() {
        let mut names = ["a", "b", "a"].into_iter().collect::<NameSet>();

        assert_eq!(names.len(), 2);
        assert!(!names.insert("b"));
        assert!(names.insert("c"));
        assert!(names.contains("c"));
        assert!(!names.contains("d"));
        assert!(NameSet::new().is_empty());
    }

    fn service_account() -> corev1::ServiceAccount {
        corev1::ServiceAccount {
            metadata: metav1::ObjectMeta::with_namespace("default", "default"),
            secrets: Some(vec![corev1::ObjectReference {
                name: Some("default-token".to_string()),
                ..k8s::default()
            }]),
            image_pull_secrets: Some(vec![corev1::LocalObjectReference {
                name: "sa-registry".to_string(),
            }]),
            ..k8s::default()
        }
    }

    #[test]
    fn config_maps_from_every_reference_kind() {
        let used = used_config_maps(&[mixed_pod()], Scan::Containers);

        assert_eq!(
            used,
            ["env-from-cm", "env-cm", "volume-cm", "projected-cm"]
                .into_iter()
                .collect::<NameSet>()
        );
    }

    #[test]
    fn config_maps_from_init_containers_when_extended() {
        let used = used_config_maps(&[mixed_pod()], Scan::Extended);

        assert!(used.contains("init-cm"));
        assert_eq!(used.len(), 5);
    }

    #[test]
    fn secrets_from_every_reference_kind() {
        let used = used_secrets(&[mixed_pod()], NO_SERVICE_ACCOUNTS, Scan::Containers);

        assert_eq!(
            used,
            [
                "env-from-secret",
                "env-secret",
                "volume-secret",
                "projected-secret",
            ]
            .into_iter()
            .collect::<NameSet>()
        );
    }

    #[test]
    fn secrets_from_init_containers_and_pull_secrets_when_extended() {
        let used = used_secrets(&[mixed_pod()], NO_SERVICE_ACCOUNTS, Scan::Extended);

        assert!(used.contains("init-secret"));
        assert!(used.contains("registry"));
        assert_eq!(used.len(), 6);
    }

    #[test]
    fn secrets_listed_by_service_accounts_only() {
        let used = used_secrets(NO_PODS, &[service_account()], Scan::Containers);

        assert_eq!(used, ["default-token"].into_iter().collect::<NameSet>());
    }

    #[test]
    fn service_account_pull_secrets_when_extended() {
        let used = used_secrets(NO_PODS, &[service_account()], Scan::Extended);

        assert!(used.contains("default-token"));
        assert!(used.contains("sa-registry"));
        assert_eq!(used.len(), 2);
    }

    #[test]
    fn scan_defaults_to_containers() {
        assert_eq!(Scan::default(), Scan::Containers);
        assert!(!Scan::default().is_extended());
    }

    #[test]
    fn secret_volume_without_name_is_skipped() {
        let pod = pod(corev1::PodSpec {
            volumes: Some(vec![volume(
                "empty",
                corev1::Volume {
                    secret: Some(corev1::SecretVolumeSource::default()),
                    ..k8s::default()
                },
            )]),
            ..k8s::default()
        });

        assert!(used_secrets(&[pod], NO_SERVICE_ACCOUNTS, Scan::Extended).is_empty());
    }

    #[test]
    fn persistent_volume_claims_from_claim_volumes_only() {
        let used = used_persistent_volume_claims(&[mixed_pod()]);

        assert_eq!(used, ["data-web-0"].into_iter().collect::<NameSet>());
    }

    #[test]
    fn union_across_pods() {
        let other = pod(corev1::PodSpec {
            containers: vec![container(vec![config_map_env_from("other-cm")], vec![])],
            ..k8s::default()
        });

        let used = used_config_maps(&[mixed_pod(), other], Scan::Containers);

        assert!(used.contains("other-cm"));
        assert!(used.contains("volume-cm"));
        assert_eq!(used.len(), 5);
    }

    #[test]
    fn no_pods_no_references() {
        assert!(used_config_maps(NO_PODS, Scan::Extended).is_empty());
        assert!(used_secrets(NO_PODS, NO_SERVICE_ACCOUNTS, Scan::Extended).is_empty());
        assert!(used_persistent_volume_claims(NO_PODS).is_empty());
    }
}

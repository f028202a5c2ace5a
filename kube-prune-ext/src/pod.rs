use super::*;

/// Value of `status.phase` for a pod whose containers have been started.
pub const POD_RUNNING: &str = "Running";

pub trait PodExt {
    /// Lifecycle phase from `status.phase`, if the pod reports one.
    fn phase(&self) -> Option<&str>;

    fn is_running(&self) -> bool {
        self.phase() == Some(POD_RUNNING)
    }

    /// Regular containers from `spec.containers`.
    fn containers(&self) -> impl Iterator<Item = &corev1::Container>;

    fn init_containers(&self) -> impl Iterator<Item = &corev1::Container>;

    fn volumes(&self) -> impl Iterator<Item = &corev1::Volume>;

    /// Names of the secrets listed in `spec.imagePullSecrets`.
    fn image_pull_secrets(&self) -> impl Iterator<Item = &str>;
}

impl PodExt for corev1::Pod {
    fn phase(&self) -> Option<&str> {
        self.status.as_ref()?.phase.as_deref()
    }

    fn containers(&self) -> impl Iterator<Item = &corev1::Container> {
        self.spec.iter().flat_map(|spec| spec.containers.iter())
    }

    fn init_containers(&self) -> impl Iterator<Item = &corev1::Container> {
        self.spec
            .iter()
            .flat_map(|spec| spec.init_containers.iter().flatten())
    }

    fn volumes(&self) -> impl Iterator<Item = &corev1::Volume> {
        self.spec
            .iter()
            .flat_map(|spec| spec.volumes.iter().flatten())
    }

    fn image_pull_secrets(&self) -> impl Iterator<Item = &str> {
        self.spec
            .iter()
            .flat_map(|spec| spec.image_pull_secrets.iter().flatten())
            .map(|secret| secret.name.as_str())
    }
}

pub trait ContainerExt {
    fn env_from(&self) -> impl Iterator<Item = &corev1::EnvFromSource>;

    /// `valueFrom` sources of the container's environment variables.
    fn env_value_sources(&self) -> impl Iterator<Item = &corev1::EnvVarSource>;
}

impl ContainerExt for corev1::Container {
    fn env_from(&self) -> impl Iterator<Item = &corev1::EnvFromSource> {
        self.env_from.iter().flatten()
    }

    fn env_value_sources(&self) -> impl Iterator<Item = &corev1::EnvVarSource> {
        self.env
            .iter()
            .flatten()
            .filter_map(|env| env.value_from.as_ref())
    }
}

pub trait VolumeExt {
    /// Sources of a projected volume; empty for every other volume type.
    fn projections(&self) -> impl Iterator<Item = &corev1::VolumeProjection>;
}

impl VolumeExt for corev1::Volume {
    fn projections(&self) -> impl Iterator<Item = &corev1::VolumeProjection> {
        self.projected
            .iter()
            .flat_map(|projected| projected.sources.iter().flatten())
    }
}

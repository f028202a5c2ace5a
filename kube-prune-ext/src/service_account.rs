use super::*;

pub trait ServiceAccountExt {
    /// Names from the service account's `secrets` references.
    fn secret_names(&self) -> impl Iterator<Item = &str>;

    fn image_pull_secret_names(&self) -> impl Iterator<Item = &str>;
}

impl ServiceAccountExt for corev1::ServiceAccount {
    fn secret_names(&self) -> impl Iterator<Item = &str> {
        self.secrets
            .iter()
            .flatten()
            .filter_map(|secret| secret.name.as_deref())
    }

    fn image_pull_secret_names(&self) -> impl Iterator<Item = &str> {
        self.image_pull_secrets
            .iter()
            .flatten()
            .map(|secret| secret.name.as_str())
    }
}

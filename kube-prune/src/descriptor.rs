use kube::ResourceExt as _;
use kube::api::DynamicObject;
use serde::de::DeserializeOwned;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A visited pruning candidate whose kind and name are known up front and
/// whose payload is only decoded when a decision needs it.
pub trait ResourceDescriptor {
    /// The declared API `kind`, if the descriptor carries type information.
    fn kind(&self) -> Option<&str>;

    fn name(&self) -> String;

    /// Decode the payload as `K`.
    fn parse<K>(&self) -> Result<K, BoxError>
    where
        K: kube::Resource + DeserializeOwned;
}

impl ResourceDescriptor for DynamicObject {
    fn kind(&self) -> Option<&str> {
        self.types.as_ref().map(|types| types.kind.as_str())
    }

    fn name(&self) -> String {
        self.name_any()
    }

    fn parse<K>(&self) -> Result<K, BoxError>
    where
        K: kube::Resource + DeserializeOwned,
    {
        self.clone().try_parse().map_err(BoxError::from)
    }
}

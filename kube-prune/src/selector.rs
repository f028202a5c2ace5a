use std::str::FromStr;

use super::*;

const NAME_MAX_LENGTH: usize = 63;
const PREFIX_MAX_LENGTH: usize = 253;
const VALUE_MAX_LENGTH: usize = 63;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("{operator:?} is not a valid label selector operator")]
    InvalidOperator { operator: String },

    #[error("values for key {key:?}: for 'In', 'NotIn' operators, values set can't be empty")]
    MissingValues { key: String },

    #[error("values for key {key:?}: values set must be empty for 'Exists', 'DoesNotExist'")]
    UnexpectedValues { key: String },

    #[error(
        "invalid label key {key:?}: name part must be 63 characters or less, \
         begin and end with an alphanumeric character and contain only alphanumerics, '-', '_' or '.', \
         with an optional DNS subdomain prefix"
    )]
    InvalidKey { key: String },

    #[error(
        "invalid label value {value:?} for key {key:?}: must be 63 characters or less, \
         begin and end with an alphanumeric character and contain only alphanumerics, '-', '_' or '.'"
    )]
    InvalidValue { key: String, value: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

impl FromStr for Operator {
    type Err = SelectorError;

    fn from_str(operator: &str) -> Result<Self, Self::Err> {
        match operator {
            "In" => Ok(Self::In),
            "NotIn" => Ok(Self::NotIn),
            "Exists" => Ok(Self::Exists),
            "DoesNotExist" => Ok(Self::DoesNotExist),
            other => Err(SelectorError::InvalidOperator {
                operator: other.to_string(),
            }),
        }
    }
}

/// A single validated `key <operator> values` clause.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Requirement {
    key: String,
    operator: Operator,
    values: BTreeSet<String>,
}

impl Requirement {
    pub fn new(
        key: impl ToString,
        operator: Operator,
        values: impl IntoIterator<Item = impl ToString>,
    ) -> Result<Self, SelectorError> {
        let key = key.to_string();
        if !is_qualified_name(&key) {
            return Err(SelectorError::InvalidKey { key });
        }

        let values = values
            .into_iter()
            .map(|value| value.to_string())
            .collect::<BTreeSet<_>>();
        match operator {
            Operator::In | Operator::NotIn if values.is_empty() => {
                return Err(SelectorError::MissingValues { key });
            }
            Operator::Exists | Operator::DoesNotExist if !values.is_empty() => {
                return Err(SelectorError::UnexpectedValues { key });
            }
            _ => {}
        }

        if let Some(value) = values.iter().find(|value| !is_label_value(value)) {
            let value = value.clone();
            return Err(SelectorError::InvalidValue { key, value });
        }

        Ok(Self {
            key,
            operator,
            values,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        let value = labels.get(&self.key);
        match self.operator {
            Operator::In => value.is_some_and(|value| self.values.contains(value)),
            Operator::NotIn => value.is_none_or(|value| !self.values.contains(value)),
            Operator::Exists => value.is_some(),
            Operator::DoesNotExist => value.is_none(),
        }
    }
}

/// A compiled label selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    /// Selects nothing; what an absent selector compiles to.
    Nothing,
    /// Selects label sets that satisfy every requirement. No requirements
    /// selects everything.
    Requirements(Vec<Requirement>),
}

impl Selector {
    pub fn everything() -> Self {
        Self::Requirements(Vec::new())
    }

    /// Compile an optional `metav1::LabelSelector`.
    ///
    /// A missing selector selects nothing, while an empty one selects
    /// everything.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::collections::BTreeMap;
    /// # use kube_prune::Selector;
    /// let labels = BTreeMap::from([("app".to_string(), "web".to_string())]);
    ///
    /// let absent = Selector::from_label_selector(None).unwrap();
    /// assert!(!absent.matches(&labels));
    ///
    /// let empty = Selector::from_label_selector(Some(&Default::default())).unwrap();
    /// assert!(empty.matches(&labels));
    /// ```
    pub fn from_label_selector(
        selector: Option<&metav1::LabelSelector>,
    ) -> Result<Self, SelectorError> {
        selector.map_or(Ok(Self::Nothing), Self::try_from)
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        match self {
            Self::Nothing => false,
            Self::Requirements(requirements) => requirements
                .iter()
                .all(|requirement| requirement.matches(labels)),
        }
    }
}

impl TryFrom<&metav1::LabelSelector> for Selector {
    type Error = SelectorError;

    fn try_from(selector: &metav1::LabelSelector) -> Result<Self, Self::Error> {
        let labels = selector
            .match_labels
            .iter()
            .flatten()
            .map(|(key, value)| Requirement::new(key, Operator::In, [value]));
        let expressions = selector
            .match_expressions
            .iter()
            .flatten()
            .map(|expression| -> Result<Requirement, SelectorError> {
                let operator = expression.operator.parse::<Operator>()?;
                Requirement::new(&expression.key, operator, expression.values.iter().flatten())
            });

        labels
            .chain(expressions)
            .collect::<Result<Vec<_>, _>>()
            .map(Self::Requirements)
    }
}

fn is_qualified_name(key: &str) -> bool {
    match key.split_once('/') {
        Some((prefix, name)) => is_dns_subdomain(prefix) && is_name(name),
        None => is_name(key),
    }
}

fn is_name(name: &str) -> bool {
    name.len() <= NAME_MAX_LENGTH
        && is_delimited(
            name,
            |c| c.is_ascii_alphanumeric(),
            |c| matches!(c, '-' | '_' | '.'),
        )
}

fn is_label_value(value: &str) -> bool {
    value.is_empty() || (value.len() <= VALUE_MAX_LENGTH && is_name(value))
}

fn is_dns_subdomain(prefix: &str) -> bool {
    prefix.len() <= PREFIX_MAX_LENGTH
        && prefix.split('.').all(|label| {
            is_delimited(
                label,
                |c| c.is_ascii_lowercase() || c.is_ascii_digit(),
                |c| c == '-',
            )
        })
}

/// Non-empty, starts and ends with an `edge` character, and every other
/// character is either an `edge` or an `inner` character.
fn is_delimited(text: &str, edge: impl Fn(char) -> bool, inner: impl Fn(char) -> bool) -> bool {
    let mut chars = text.chars();
    let (Some(first), last) = (chars.next(), chars.next_back()) else {
        return false;
    };
    edge(first) && last.is_none_or(&edge) && chars.all(|c| edge(c) || inner(c))
}

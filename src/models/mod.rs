pub mod inventory;
pub mod invoice;
pub mod product;
pub mod user;

pub use inventory::*;
pub use invoice::*;
pub use product::*;
pub use user::*;

use serde::{Deserialize, Deserializer};

/// Keeps an explicit `null` apart from an absent field in update requests:
/// absent stays `None`, `null` becomes `Some(None)`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_clears_while_absent_keeps() {
        let absent: UpdateProductRequest = serde_json::from_str(r#"{"price":"1.00"}"#).unwrap();
        assert_eq!(absent.description, None);

        let cleared: UpdateProductRequest = serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));

        let set: UpdateInventoryRequest = serde_json::from_str(r#"{"location":"Aisle 4"}"#).unwrap();
        assert_eq!(set.location, Some(Some("Aisle 4".to_string())));
    }
}

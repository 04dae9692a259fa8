//! Product inventory list.

use tracing::info;

use crate::error::ActionError;
use crate::model::Product;
use crate::session::SessionContext;
use crate::store::InventoryStore;
use crate::validation;

/// Add-product form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductForm {
    pub name: String,
    pub quantity: String,
}

impl ProductForm {
    pub fn new(name: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.into(),
        }
    }

    /// Trimmed (name, quantity) once both fields are valid.
    pub fn parse(&self) -> Result<(String, String), String> {
        validation::validate_product_field("Product name", &self.name)?;
        validation::validate_product_field("Quantity", &self.quantity)?;
        Ok((self.name.trim().to_string(), self.quantity.trim().to_string()))
    }
}

pub async fn load_products<S: InventoryStore>(store: &S) -> Result<Vec<Product>, ActionError> {
    Ok(store.list_products().await?)
}

pub async fn add_product<S: InventoryStore>(
    store: &S,
    ctx: &SessionContext,
    form: &ProductForm,
) -> Result<Product, ActionError> {
    let session = ctx.require()?;
    let (name, quantity) = form.parse().map_err(ActionError::Invalid)?;
    let product = store.insert_product(session, &name, &quantity).await?;
    info!(event = "products.added", id = %product.id);
    Ok(product)
}

pub async fn delete_product<S: InventoryStore>(
    store: &S,
    ctx: &SessionContext,
    product_id: &str,
) -> Result<(), ActionError> {
    let session = ctx.require()?;
    store.delete_product(session, product_id).await?;
    info!(event = "products.deleted", id = %product_id);
    Ok(())
}

/// Client-side copy of the inventory, newest first.
#[derive(Debug, Default, Clone)]
pub struct Inventory {
    pub products: Vec<Product>,
}

impl Inventory {
    pub fn replace(&mut self, products: Vec<Product>) {
        self.products = products;
    }

    /// Show a newly added product at the top.
    pub fn add(&mut self, product: Product) {
        self.products.retain(|p| p.id != product.id);
        self.products.insert(0, product);
    }

    pub fn remove(&mut self, product_id: &str) -> bool {
        let before = self.products.len();
        self.products.retain(|p| p.id != product_id);
        self.products.len() != before
    }

    /// Resolve a user-typed reference: a 1-based list position or an id prefix.
    pub fn resolve(&self, reference: &str) -> Option<&Product> {
        if let Ok(position) = reference.parse::<usize>() {
            return position
                .checked_sub(1)
                .and_then(|index| self.products.get(index));
        }
        let mut matches = self.products.iter().filter(|p| p.id.starts_with(reference));
        match (matches.next(), matches.next()) {
            (Some(product), None) => Some(product),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{AuthStore, MemoryStore, StoreError};
    use chrono::Utc;

    fn product(id: &str, name: &str) -> Product {
        Product {
            id: id.into(),
            name: name.into(),
            quantity: "1 unit".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_form_parse() {
        assert_eq!(
            ProductForm::new(" Rice ", "25kg Bag").parse(),
            Ok(("Rice".to_string(), "25kg Bag".to_string()))
        );
        assert!(ProductForm::new("", "25kg Bag").parse().is_err());
        assert!(ProductForm::new("Rice", " ").parse().is_err());
    }

    #[test]
    fn test_inventory_add_and_remove() {
        let mut inventory = Inventory::default();
        inventory.replace(vec![product("a1", "Rice"), product("b2", "Dal")]);
        inventory.add(product("c3", "Cooking Oil"));
        assert_eq!(inventory.products[0].name, "Cooking Oil");

        assert!(inventory.remove("a1"));
        assert!(!inventory.remove("a1"));
        assert_eq!(inventory.products.len(), 2);
    }

    #[test]
    fn test_inventory_resolve() {
        let mut inventory = Inventory::default();
        inventory.replace(vec![product("abc", "Rice"), product("abd", "Dal")]);
        assert_eq!(inventory.resolve("2").map(|p| p.name.as_str()), Some("Dal"));
        assert_eq!(inventory.resolve("abc").map(|p| p.name.as_str()), Some("Rice"));
        assert!(inventory.resolve("ab").is_none());
        assert!(inventory.resolve("0").is_none());
        assert!(inventory.resolve("9").is_none());
    }

    #[tokio::test]
    async fn test_add_then_delete_through_store() {
        let store = MemoryStore::new();
        let mut ctx = SessionContext::new();
        assert_eq!(
            add_product(&store, &ctx, &ProductForm::new("Rice", "25kg Bag")).await,
            Err(ActionError::NotSignedIn)
        );

        ctx.sign_in(store.sign_up("Max", "m@example.com", "secret1").await.unwrap());
        add_product(&store, &ctx, &ProductForm::new("Rice", "25kg Bag")).await.unwrap();
        let oil = add_product(&store, &ctx, &ProductForm::new("Cooking Oil", "5L Can"))
            .await
            .unwrap();
        assert_eq!(load_products(&store).await.unwrap()[0].id, oil.id);

        delete_product(&store, &ctx, &oil.id).await.unwrap();
        assert_eq!(
            delete_product(&store, &ctx, &oil.id).await,
            Err(ActionError::Store(StoreError::NotFound(format!("product {}", oil.id))))
        );
        assert_eq!(load_products(&store).await.unwrap().len(), 1);
    }
}

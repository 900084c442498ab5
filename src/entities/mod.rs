pub mod order;
pub mod order_item;
pub mod product;

pub use order::Entity as Order;
pub use order::Model as OrderModel;
pub use order_item::Entity as OrderItem;
pub use order_item::Model as OrderItemModel;
pub use product::Entity as Product;
pub use product::Model as ProductModel;

pub mod address;
pub mod cart;
pub mod payment;
pub mod wishlist;

pub use address::ShippingAddress;
pub use cart::{Cart, CartItem, VariantKey};
pub use payment::{PaymentCallback, PaymentDetails, PaymentMethod, PaymentStatus};
pub use wishlist::{Wishlist, WishlistItem};

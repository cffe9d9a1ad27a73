//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod category;
pub mod family;
pub mod family_member;
pub mod item_reservation;
pub mod price_history;
pub mod refresh_token;
pub mod user;
pub mod wishlist_item;

// Re-export specific types to avoid conflicts
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use family::{Column as FamilyColumn, Currency, Entity as Family, Model as FamilyModel};
pub use family_member::{
    Column as FamilyMemberColumn, Entity as FamilyMember, MemberRole, MemberStatus,
    Model as FamilyMemberModel,
};
pub use item_reservation::{
    Column as ItemReservationColumn, Entity as ItemReservation, Model as ItemReservationModel,
    ReservationStatus,
};
pub use price_history::{
    Column as PriceHistoryColumn, Entity as PriceHistory, Model as PriceHistoryModel,
};
pub use refresh_token::{
    Column as RefreshTokenColumn, Entity as RefreshToken, Model as RefreshTokenModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
pub use wishlist_item::{
    Column as WishlistItemColumn, Entity as WishlistItem, Model as WishlistItemModel, Priority,
};

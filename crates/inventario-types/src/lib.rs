//! Shared data model for the inventory dashboard.

pub mod account;
pub mod asset;
pub mod chat;
pub mod filter;
pub mod notice;
pub mod session;
pub mod stats;
pub mod view;

pub use account::{Account, Accounts, AccountsError};
pub use asset::{Asset, AssetFields, InventoryQuery, Rating};
pub use chat::{ChatAction, ChatMessage, MessageRole};
pub use filter::{AssetFilter, FilterOptions};
pub use notice::{Notice, NoticeLevel};
pub use session::{Permission, Permissions, Role, Session};
pub use stats::{CriticalityBreakdown, InventoryStats};
pub use view::{InventoryItem, StockStatus};

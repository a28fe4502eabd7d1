pub mod organization;
pub mod permission;
pub mod team;
pub mod token;
pub mod user;

pub use organization::{Organization, OrganizationChanges};
pub use permission::{NewPermission, Permission};
pub use team::{Team, TeamChanges};
pub use token::Token;
pub use user::{NewUser, User, UserChanges};

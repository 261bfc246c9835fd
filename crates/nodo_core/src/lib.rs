pub mod domain;
pub mod events;
pub mod gate;
pub mod menu;
pub mod ports;
pub mod roles;
pub mod session;

pub use domain::{Brand, SessionToken, User};
pub use events::{TokenEvent, TokenEvents};
pub use gate::{GateDecision, ProtectionPolicy, RouteClass, RouteTable};
pub use menu::{resolve_menu, MenuEntry};
pub use ports::{PortError, PortResult, TokenStore, UserDirectory};
pub use roles::{default_route, is_admin_like, is_client_like, Role, RoleCategory};
pub use session::{SessionContext, SessionEntry};

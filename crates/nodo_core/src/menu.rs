//! crates/nodo_core/src/menu.rs
//!
//! Builds the navigation menu a role is allowed to see.

use crate::roles::{is_admin_like, Role};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    pub path: &'static str,
    pub icon: &'static str,
    pub label: &'static str,
}

const PROJECTS: MenuEntry = MenuEntry {
    path: "/admin/proyectos",
    icon: "folder",
    label: "Proyectos",
};
const COURSES: MenuEntry = MenuEntry {
    path: "/admin/cursos",
    icon: "book",
    label: "Cursos",
};
const TRANSACTIONS: MenuEntry = MenuEntry {
    path: "/admin/transacciones",
    icon: "receipt",
    label: "Transacciones",
};
const USERS: MenuEntry = MenuEntry {
    path: "/admin/usuarios",
    icon: "users",
    label: "Usuarios",
};
const MY_PROFILE: MenuEntry = MenuEntry {
    path: "/dashboard/mi-perfil",
    icon: "user",
    label: "Mi perfil",
};

const FULL_MENU: [MenuEntry; 5] = [PROJECTS, COURSES, TRANSACTIONS, USERS, MY_PROFILE];
const REDUCED_MENU: [MenuEntry; 2] = [PROJECTS, MY_PROFILE];

/// Admin-like roles get the full menu. Every other role, including an absent
/// or unrecognised one, gets the reduced menu.
pub fn resolve_menu(role: Option<&Role>) -> Vec<MenuEntry> {
    if is_admin_like(role) {
        FULL_MENU.to_vec()
    } else {
        REDUCED_MENU.to_vec()
    }
}

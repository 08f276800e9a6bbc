//! Roles, permissions and the authenticated session.
//!
//! Office roles are named after the organisational unit that owns assets, and
//! that same name is stored in `DUEÑO_DE_ACTIVO`.  A role that cannot view
//! everything only sees the assets it owns.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use uuid::Uuid;

use crate::asset::Asset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter)]
pub enum Role {
    #[serde(rename = "admin")]
    #[strum(serialize = "admin")]
    Admin,
    #[serde(rename = "Jefe Oficina de Control Interno")]
    #[strum(serialize = "Jefe Oficina de Control Interno")]
    InternalControl,
    #[serde(rename = "Subdirección Financiera y Administrativa")]
    #[strum(serialize = "Subdirección Financiera y Administrativa")]
    FinanceAdministration,
    #[serde(rename = "Asesor de la Dirección para Comunicaciones y Servicio al Ciudadano")]
    #[strum(serialize = "Asesor de la Dirección para Comunicaciones y Servicio al Ciudadano")]
    Communications,
    #[serde(rename = "Oficina de Control Disciplinario Interno")]
    #[strum(serialize = "Oficina de Control Disciplinario Interno")]
    DisciplinaryControl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub can_create: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_view_all: bool,
}

/// An action gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Create,
    Edit,
    Delete,
    ViewAll,
}

impl Role {
    pub fn permissions(self) -> Permissions {
        match self {
            Role::Admin => Permissions {
                can_create: true,
                can_edit: true,
                can_delete: true,
                can_view_all: true,
            },
            Role::InternalControl
            | Role::FinanceAdministration
            | Role::Communications
            | Role::DisciplinaryControl => Permissions {
                can_create: true,
                can_edit: true,
                can_delete: false,
                can_view_all: false,
            },
        }
    }

    pub fn allows(self, permission: Permission) -> bool {
        let p = self.permissions();
        match permission {
            Permission::Create => p.can_create,
            Permission::Edit => p.can_edit,
            Permission::Delete => p.can_delete,
            Permission::ViewAll => p.can_view_all,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Role::Admin => "Acceso completo a todos los datos",
            Role::InternalControl => "Acceso a datos de Control Interno",
            Role::FinanceAdministration => "Acceso a datos financieros y administrativos",
            Role::Communications => "Acceso a datos de comunicaciones",
            Role::DisciplinaryControl => "Acceso a datos de control disciplinario",
        }
    }

    /// Owner value the view is restricted to, or `None` for unrestricted roles.
    pub fn owner_filter(self) -> Option<String> {
        if self.permissions().can_view_all {
            None
        } else {
            Some(self.to_string())
        }
    }

    pub fn all() -> Vec<Role> {
        Role::iter().collect()
    }
}

/// The logged-in user, passed explicitly to whatever needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub username: String,
    pub token: String,
    pub role: Role,
}

impl Session {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            token: format!("token_{}", Uuid::new_v4().simple()),
            role,
        }
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.role.allows(permission)
    }

    pub fn can_see(&self, asset: &Asset) -> bool {
        match self.role.owner_filter() {
            None => true,
            Some(owner) => asset.fields.owner.as_deref() == Some(owner.as_str()),
        }
    }

    /// The subset of `assets` this session may view.
    pub fn visible(&self, assets: Vec<Asset>) -> Vec<Asset> {
        assets.into_iter().filter(|a| self.can_see(a)).collect()
    }
}

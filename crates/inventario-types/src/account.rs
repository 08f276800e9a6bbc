//! Login accounts.
//!
//! The dashboard has no user directory; a fixed list of accounts maps
//! credentials onto roles.  [`Accounts::parse`] reads the list from a
//! `user:password:role` spec, one account per `;`-separated entry.

use std::str::FromStr;

use crate::session::{Role, Session};

#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub username: String,
    password: String,
    pub role: Role,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("username", &self.username)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

impl Account {
    pub fn new(username: impl Into<String>, password: impl Into<String>, role: Role) -> Self {
        Self { username: username.into(), password: password.into(), role }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accounts(Vec<Account>);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountsError {
    #[error("account entry {0} is not `user:password:role`")]
    Malformed(usize),
    #[error("account entry {index} has unknown role `{role}`")]
    UnknownRole { index: usize, role: String },
    #[error("no accounts configured")]
    Empty,
}

impl Accounts {
    /// The demonstration accounts, one per role plus the shared admin login.
    pub fn builtin() -> Self {
        Self(vec![
            Account::new("admin", "admin123", Role::Admin),
            Account::new("jefe_oficina", "jefe123", Role::InternalControl),
            Account::new("finanzas", "finanzas123", Role::FinanceAdministration),
            Account::new("asesor_direccion", "direccion123", Role::Communications),
            Account::new("oficina_control", "control123", Role::DisciplinaryControl),
            Account::new("USBBOG", "usb123#", Role::Admin),
        ])
    }

    pub fn parse(spec: &str) -> Result<Self, AccountsError> {
        let mut accounts = Vec::new();
        for (index, entry) in spec.split(';').map(str::trim).filter(|e| !e.is_empty()).enumerate() {
            let mut parts = entry.splitn(3, ':');
            let (Some(user), Some(password), Some(role)) = (parts.next(), parts.next(), parts.next()) else {
                return Err(AccountsError::Malformed(index));
            };
            if user.is_empty() || password.is_empty() {
                return Err(AccountsError::Malformed(index));
            }
            let role = Role::from_str(role.trim())
                .map_err(|_| AccountsError::UnknownRole { index, role: role.to_string() })?;
            accounts.push(Account::new(user, password, role));
        }
        if accounts.is_empty() {
            return Err(AccountsError::Empty);
        }
        Ok(Self(accounts))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A fresh session for matching credentials.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<Session> {
        self.0
            .iter()
            .find(|a| a.username == username && a.password == password)
            .map(|a| Session::new(a.username.as_str(), a.role))
    }
}

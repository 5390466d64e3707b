use std::fmt;
use std::str::FromStr;

use super::errors::DomainError;

/// Roles a caller can hold. Stored as `customer` / `truckOwner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Customer,
    TruckOwner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::TruckOwner => "truckOwner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "truckOwner" => Ok(Role::TruckOwner),
            other => Err(DomainError::Internal(format!("unknown role '{other}'"))),
        }
    }
}

/// The resolved identity behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i32,
    pub role: Role,
}

impl Caller {
    pub fn customer(user_id: i32) -> Self {
        Self {
            user_id,
            role: Role::Customer,
        }
    }

    pub fn truck_owner(user_id: i32) -> Self {
        Self {
            user_id,
            role: Role::TruckOwner,
        }
    }
}

/// The one place role checks happen. Handlers and services never compare
/// role strings themselves.
pub fn authorize(caller: &Caller, required: Role) -> Result<(), DomainError> {
    if caller.role == required {
        Ok(())
    } else {
        Err(DomainError::forbidden(match required {
            Role::Customer => "only customers can perform this action",
            Role::TruckOwner => "only truck owners can perform this action",
        }))
    }
}

/// Unwraps an optional caller, failing with `Unauthorized`.
pub fn require_caller(caller: Option<&Caller>) -> Result<&Caller, DomainError> {
    caller.ok_or(DomainError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_stored_values() {
        assert_eq!("customer".parse::<Role>().unwrap(), Role::Customer);
        assert_eq!("truckOwner".parse::<Role>().unwrap(), Role::TruckOwner);
    }

    #[test]
    fn role_parse_is_case_sensitive() {
        assert!("Customer".parse::<Role>().is_err());
        assert!("truckowner".parse::<Role>().is_err());
    }

    #[test]
    fn authorize_accepts_matching_role() {
        assert!(authorize(&Caller::customer(1), Role::Customer).is_ok());
        assert!(authorize(&Caller::truck_owner(1), Role::TruckOwner).is_ok());
    }

    #[test]
    fn authorize_rejects_other_role_as_forbidden() {
        let err = authorize(&Caller::truck_owner(1), Role::Customer).unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[test]
    fn require_caller_without_identity_is_unauthorized() {
        assert_eq!(require_caller(None).unwrap_err(), DomainError::Unauthorized);
    }
}

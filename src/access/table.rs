//! The static permission table and its evaluator

use super::{AccessLevel, Module, Role};

/// Look up the access level a role holds on a module.
///
/// Total by construction: both enumerations are closed, and the match is
/// exhaustive, so every (role, module) pair has a defined level. Pure and
/// deterministic; never panics.
pub fn level_for(role: Role, module: Module) -> AccessLevel {
    use AccessLevel::{Edit, Full, None, View};
    use Module::*;

    match role {
        Role::Admin => Full,
        Role::Manager => match module {
            Services | Clients | Operations => Full,
            Wiki => Edit,
            Headquarters | Legal | Finance | Brand | Analytics => View,
        },
        Role::User => match module {
            Operations => Edit,
            Services | Clients | Wiki | Brand => View,
            Headquarters | Legal | Finance | Analytics => None,
        },
        Role::Client => match module {
            Clients => View,
            _ => None,
        },
    }
}

/// True iff the role's level on the module satisfies the required level.
///
/// Callers always ask for `View`/`Edit`/`Full`; requiring `None` is
/// trivially satisfied and not meaningful.
pub fn has_permission(role: Role, module: Module, required: AccessLevel) -> bool {
    level_for(role, module).satisfies(required)
}

/// Modules the role may at least view, in display order.
pub fn visible_modules(role: Role) -> Vec<Module> {
    Module::ALL
        .into_iter()
        .filter(|m| has_permission(role, *m, AccessLevel::View))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_admin_has_full_everywhere() {
        for module in Module::ALL {
            assert_eq!(level_for(Role::Admin, module), AccessLevel::Full);
        }
    }

    #[test]
    fn test_manager_row() {
        assert_eq!(level_for(Role::Manager, Module::Headquarters), AccessLevel::View);
        assert_eq!(level_for(Role::Manager, Module::Legal), AccessLevel::View);
        assert_eq!(level_for(Role::Manager, Module::Finance), AccessLevel::View);
        assert_eq!(level_for(Role::Manager, Module::Services), AccessLevel::Full);
        assert_eq!(level_for(Role::Manager, Module::Clients), AccessLevel::Full);
        assert_eq!(level_for(Role::Manager, Module::Operations), AccessLevel::Full);
        assert_eq!(level_for(Role::Manager, Module::Wiki), AccessLevel::Edit);
        assert_eq!(level_for(Role::Manager, Module::Brand), AccessLevel::View);
        assert_eq!(level_for(Role::Manager, Module::Analytics), AccessLevel::View);
    }

    #[test]
    fn test_user_row() {
        assert_eq!(level_for(Role::User, Module::Headquarters), AccessLevel::None);
        assert_eq!(level_for(Role::User, Module::Legal), AccessLevel::None);
        assert_eq!(level_for(Role::User, Module::Finance), AccessLevel::None);
        assert_eq!(level_for(Role::User, Module::Services), AccessLevel::View);
        assert_eq!(level_for(Role::User, Module::Clients), AccessLevel::View);
        assert_eq!(level_for(Role::User, Module::Operations), AccessLevel::Edit);
        assert_eq!(level_for(Role::User, Module::Wiki), AccessLevel::View);
        assert_eq!(level_for(Role::User, Module::Brand), AccessLevel::View);
        assert_eq!(level_for(Role::User, Module::Analytics), AccessLevel::None);
    }

    #[test]
    fn test_client_row() {
        for module in Module::ALL {
            let expected = if module == Module::Clients {
                AccessLevel::View
            } else {
                AccessLevel::None
            };
            assert_eq!(level_for(Role::Client, module), expected);
        }
    }

    #[test]
    fn test_visible_modules() {
        assert_eq!(visible_modules(Role::Admin).len(), 9);
        assert_eq!(visible_modules(Role::Client), vec![Module::Clients]);
        assert_eq!(
            visible_modules(Role::User),
            vec![
                Module::Services,
                Module::Clients,
                Module::Operations,
                Module::Wiki,
                Module::Brand,
            ]
        );
    }
}

use crate::models::{AddressPredicate, User};

/// Returns the field value when it is set and not blank
#[inline]
pub fn field(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Case-insensitive equality that only holds when both sides are set
#[inline]
pub fn same_field(a: &Option<String>, b: &Option<String>) -> bool {
    match (field(a), field(b)) {
        (Some(a), Some(b)) => eq_ignore_case(a, b),
        _ => false,
    }
}

#[inline]
fn eq_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Check if a user's company address satisfies an exact-match predicate
///
/// Users without a company address never match.
pub fn matches_predicate(user: &User, predicate: &AddressPredicate) -> bool {
    let Some(company) = user.company_address.as_ref() else {
        return false;
    };

    match predicate {
        AddressPredicate::OfficeName(name) => matches_value(&company.office_name, name),
        AddressPredicate::StreetAndCity { street, city } => {
            matches_value(&company.street, street)
                && match city {
                    Some(city) => matches_value(&company.city, city),
                    None => field(&company.city).is_none(),
                }
        }
        AddressPredicate::City(city) => matches_value(&company.city, city),
        AddressPredicate::HasCompanyAddress => true,
    }
}

#[inline]
fn matches_value(value: &Option<String>, expected: &str) -> bool {
    field(value).map_or(false, |v| eq_ignore_case(v, expected.trim()))
}

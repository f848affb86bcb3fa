//! Initial marking
//!
//! Seeds the contract net with users, their balances and the sender
//! values allowed for each function, then initialises the parameter place
//! of every retained function.

use log::{debug, warn};
use rand::Rng;

use super::dependency::RetainedSet;
use crate::error::{Error, Result};
use crate::net::{Color, Constant, Parameter, StructuredNet};
use crate::parser::{BalancePolicy, MarkingSpec};

/// Color of the balance and sender-value tables
pub const BALANCE_TABLE: &str = "UINT_ARRAY";

/// Most entries a balance or sender-value table can hold
pub const TABLE_CAPACITY: i64 = 1000;

fn balance_table() -> Color {
    Color::List {
        name: BALANCE_TABLE.to_string(),
        index: "UINT".to_string(),
        element: "UINT".to_string(),
        capacity: TABLE_CAPACITY.to_string(),
    }
}

fn too_large(field: &str, value: impl ToString) -> Error {
    Error::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: format!("{} holds at most {} entries", BALANCE_TABLE, TABLE_CAPACITY),
    }
}

/// Number of values in `from..=to`, if it fits the table
fn table_len(field: &str, from: i64, to: i64) -> Result<i64> {
    match to.checked_sub(from).and_then(|d| d.checked_add(1)) {
        Some(len) if len <= TABLE_CAPACITY => Ok(len),
        _ => Err(too_large(field, format!("{}..{}", from, to))),
    }
}

/// Comma separated balances, one per user
fn balances<R: Rng + ?Sized>(policy: &BalancePolicy, users: i64, rng: &mut R) -> Result<String> {
    let values = match policy {
        BalancePolicy::Fixed { fixed } => (0..users).map(|_| fixed.to_string()).collect::<Vec<_>>(),
        BalancePolicy::Map { map } => {
            let entries = map.split(',').filter(|v| !v.trim().is_empty()).count();
            if entries as i64 > TABLE_CAPACITY {
                return Err(too_large("balance.map", entries));
            }
            return Ok(map.trim().to_string());
        }
        BalancePolicy::Random { random } => {
            random.validate("balance.random")?;
            (0..users)
                .map(|_| rng.gen_range(random.from..=random.to).to_string())
                .collect()
        }
    };
    Ok(values.join(","))
}

fn sequence(from: i64, to: i64) -> String {
    (from..=to).map(|v| v.to_string()).collect::<Vec<_>>().join(",")
}

/// Initial tokens of `P_<function>`: one per user and allowed sender value
pub fn parameter_init(function: &str) -> String {
    format!(
        "for (i in ADDRESS range 1 .. ADDRESS (users), j in UINT range 0 .. UINT({f}_sdr-1)) \
         <( {{{{i, UINT(user_balance[UINT(i-1)])}},{f}_sender_value[j]}})>",
        f = function
    )
}

/// Apply `marking` to `net`
///
/// Only the contract entry whose name equals the net's name contributes
/// sender ranges.
pub fn apply_marking<R: Rng + ?Sized>(
    net: &mut StructuredNet,
    marking: &MarkingSpec,
    retained: &RetainedSet,
    rng: &mut R,
) -> Result<()> {
    let users = marking.number_of_users;
    if users < 1 {
        return Err(Error::InvalidValue {
            field: "NumberOfUser".to_string(),
            value: users.to_string(),
            reason: "at least one user is required".to_string(),
        });
    }
    if users > TABLE_CAPACITY {
        return Err(too_large("NumberOfUser", users));
    }

    net.add_color(balance_table());
    net.add_parameter(Parameter::new("users", users.to_string()));
    let table = format!("|{}|", balances(&marking.balance, users, rng)?);
    debug!("user balances: {}", table);
    net.add_color(Constant::new("user_balance", BALANCE_TABLE, table));

    let functions = marking.functions_of(&net.name);
    for function in functions {
        let range = function.sender_value;
        let field = format!("{}.sender_value", function.name);
        range.validate(&field)?;
        let len = table_len(&field, range.from, range.to)?;
        net.add_parameter(Parameter::new(format!("{}_sdr", function.name), len.to_string()));
        net.add_color(Constant::new(
            format!("{}_sender_value", function.name),
            BALANCE_TABLE,
            format!("|{}|", sequence(range.from, range.to)),
        ));
    }

    for place in net.places_mut() {
        let Some(function) = place.name.strip_prefix("P_") else {
            continue;
        };
        if !retained.contains(function) {
            continue;
        }
        if !functions.iter().any(|f| f.name == function) {
            warn!("no sender range for `{}`, its initial marking refers to undefined constants", function);
        }
        place.init = Some(parameter_init(function));
    }

    Ok(())
}

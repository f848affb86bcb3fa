//! Net merge
//!
//! Combines the contract net with its context and wires every sub-model
//! into the control-flow skeleton. A retained sub-model runs between the
//! `state_cflow` place and its own `<fn>_cflow` place; everything else only
//! loops on `state_cflow`.

use log::{debug, warn};

use super::dependency::RetainedSet;
use crate::net::{cflow_place, Arc, Comment, Node, Place, StructuredNet, Transition, STATE_PLACE, STATE_SUB_MODEL};

/// Control-flow place of `sub_model`; only the `state` one is initially marked
fn cflow(sub_model: &str) -> Place {
    let place = Place::new(cflow_place(sub_model), "epsilon");
    if sub_model == STATE_SUB_MODEL {
        place.with_init("epsilon")
    } else {
        place
    }
}

/// Where a transition of `sub_model` hands control back to
fn target(sub_model: Option<&str>, retained: &RetainedSet) -> String {
    match sub_model {
        Some(name) if retained.contains(name) => cflow_place(name),
        _ => cflow_place(STATE_SUB_MODEL),
    }
}

fn copy_declarations(out: &mut StructuredNet, net: &StructuredNet) {
    for parameter in net.parameters() {
        out.add_parameter(parameter.clone());
    }
    for node in net.colors() {
        out.add_color(node.clone());
    }
    for node in net.functions() {
        out.add_function(node.clone());
    }
}

/// Places of retained sub-models, each group led by its banner and a fresh
/// control-flow place
fn copy_contract_places(out: &mut StructuredNet, contract: &StructuredNet, retained: &RetainedSet) {
    let mut current: Option<&str> = None;
    let mut created: Vec<&str> = Vec::new();

    for node in contract.places() {
        if let Some(name) = node.banner_name() {
            current = Some(name);
            if retained.contains(name) {
                out.add_place(Comment::banner(name));
                if !created.contains(&name) {
                    created.push(name);
                    out.add_place(cflow(name));
                }
            }
        } else if matches!(node, Node::Place(_)) && current.is_some_and(|c| retained.contains(c)) {
            out.add_place(node.clone());
        }
    }
}

/// Connect a contract transition of `sub_model` to the control-flow places
///
/// Entering the sub-model (reading `S`) consumes its control token and
/// leaving it (writing `S`) returns control to the state.
fn rewire(transition: &Transition, sub_model: &str) -> Transition {
    let mut transition = transition.clone();
    if transition.input_from(STATE_PLACE).is_some() {
        transition.add_input(Arc::epsilon(cflow_place(sub_model)));
    }
    if transition.output_to(STATE_PLACE).is_some() {
        transition.add_output(Arc::epsilon(cflow_place(STATE_SUB_MODEL)));
    }
    transition
}

fn copy_contract_transitions(out: &mut StructuredNet, contract: &StructuredNet, retained: &RetainedSet) {
    let mut current: Option<&str> = None;
    for node in contract.transitions() {
        if let Some(name) = node.banner_name() {
            current = Some(name);
            if retained.contains(name) {
                out.add_transition(Comment::banner(name));
            }
        } else if let (Some(transition), Some(sub_model)) = (node.as_transition(), current) {
            if retained.contains(sub_model) {
                out.add_transition(rewire(transition, sub_model));
            }
        }
    }
}

/// Add missing control-flow places for retained sub-models
pub fn complete_control_flow(net: &mut StructuredNet, retained: &RetainedSet) {
    for name in retained.names() {
        let place = cflow_place(name);
        if net.place_by_name(&place).is_none() {
            warn!("sub-model `{}` has no places, adding `{}`", name, place);
            net.add_place(cflow(name));
        }
    }
}

/// Merge `contract` with a CPN (or translated DCR) `context` net
///
/// Context places survive only under retained banners. Every context
/// transition fires from `state_cflow` and hands control to its own
/// sub-model when retained.
pub fn merge_with_context(context: &StructuredNet, contract: &StructuredNet, retained: &RetainedSet) -> StructuredNet {
    let mut out = StructuredNet::new(contract.name.clone());
    copy_declarations(&mut out, context);

    let mut current: Option<&str> = None;
    for node in context.places() {
        if let Some(name) = node.banner_name() {
            current = Some(name);
            if retained.contains(name) {
                out.add_place(node.clone());
            }
        } else if matches!(node, Node::Place(_)) && current.is_some_and(|c| retained.contains(c)) {
            out.add_place(node.clone());
        }
    }

    current = None;
    for node in context.transitions() {
        if let Some(name) = node.banner_name() {
            current = Some(name);
            out.add_transition(node.clone());
        } else if let Some(transition) = node.as_transition() {
            let mut transition = transition.clone();
            transition.add_input(Arc::epsilon(cflow_place(STATE_SUB_MODEL)));
            transition.add_output(Arc::epsilon(target(current, retained)));
            out.add_transition(transition);
        }
    }
    debug!("context `{}` merged", context.name);

    copy_declarations(&mut out, contract);
    copy_contract_places(&mut out, contract, retained);
    copy_contract_transitions(&mut out, contract, retained);
    complete_control_flow(&mut out, retained);
    out
}

/// Merge `contract` without a context
///
/// Each sub-model gets one synthesized transition named after it that
/// moves control from `state_cflow` into the sub-model, or back onto
/// `state_cflow` when the sub-model is not retained.
pub fn merge_free(contract: &StructuredNet, retained: &RetainedSet) -> StructuredNet {
    let mut out = StructuredNet::new(contract.name.clone());
    copy_declarations(&mut out, contract);
    copy_contract_places(&mut out, contract, retained);

    let mut current: Option<&str> = None;
    let mut synthesized: Vec<&str> = Vec::new();
    for node in contract.transitions() {
        if let Some(name) = node.banner_name() {
            current = Some(name);
            out.add_transition(Comment::banner(name));
            if !synthesized.contains(&name) {
                synthesized.push(name);
                let mut entry = Transition::new(name);
                entry.add_input(Arc::epsilon(cflow_place(STATE_SUB_MODEL)));
                entry.add_output(Arc::epsilon(target(Some(name), retained)));
                out.add_transition(entry);
            }
        } else if let (Some(transition), Some(sub_model)) = (node.as_transition(), current) {
            if retained.contains(sub_model) {
                out.add_transition(rewire(transition, sub_model));
            }
        }
    }

    complete_control_flow(&mut out, retained);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::Section;

    fn contract() -> StructuredNet {
        let mut net = StructuredNet::new("Bank");
        net.add_parameter(crate::net::Parameter::new("n", "1"));
        net.add_place(Comment::banner("state"));
        net.add_place(Place::new("S", "STATE"));
        net.add_place(Comment::banner("deposit"));
        net.add_place(Place::new("P_deposit", "PARAM"));
        net.add_place(Comment::banner("withdraw"));
        net.add_place(Place::new("P_withdraw", "PARAM"));

        net.add_transition(Comment::banner("deposit"));
        let mut start = Transition::new("deposit_start");
        start.add_input(Arc::new("S", "s"));
        start.add_input(Arc::new("P_deposit", "p"));
        net.add_transition(start);
        let mut end = Transition::new("deposit_end");
        end.add_output(Arc::new("S", "s"));
        net.add_transition(end);
        net.add_transition(Comment::banner("withdraw"));
        let mut w = Transition::new("withdraw_start");
        w.add_input(Arc::new("S", "s"));
        net.add_transition(w);
        net
    }

    fn retained(names: &[&str]) -> RetainedSet {
        let mut set = RetainedSet::new();
        for name in names {
            set.insert(name);
        }
        set
    }

    fn cflow_places(net: &StructuredNet) -> Vec<&Place> {
        net.places()
            .iter()
            .filter_map(Node::as_place)
            .filter(|p| p.name.ends_with("_cflow"))
            .collect()
    }

    #[test]
    fn test_free_merge_keeps_only_retained() {
        let merged = merge_free(&contract(), &retained(&["deposit"]));

        assert!(merged.place_by_name("P_deposit").is_some());
        assert!(merged.place_by_name("P_withdraw").is_none());
        assert!(merged.transition_by_name("withdraw_start").is_none());

        let start = merged.transition_by_name("deposit_start").unwrap();
        assert!(start.input_from("deposit_cflow").is_some());
        let end = merged.transition_by_name("deposit_end").unwrap();
        assert!(end.output_to("state_cflow").is_some());
        assert!(end.input_from("deposit_cflow").is_none());

        let entry = merged.transition_by_name("deposit").unwrap();
        assert!(entry.input_from("state_cflow").is_some());
        assert!(entry.output_to("deposit_cflow").is_some());
        let skip = merged.transition_by_name("withdraw").unwrap();
        assert!(skip.output_to("state_cflow").is_some());

        assert_eq!(merged.sub_models(Section::Transitions), ["deposit", "withdraw"]);
        assert_eq!(merged.sub_models(Section::Places), ["state", "deposit"]);
    }

    #[test]
    fn test_single_marked_cflow_per_retained_sub_model() {
        let merged = merge_free(&contract(), &retained(&["deposit", "withdraw"]));
        let places = cflow_places(&merged);
        let names: Vec<&str> = places.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["state_cflow", "deposit_cflow", "withdraw_cflow"]);
        let marked: Vec<&str> = places
            .iter()
            .filter(|p| p.init.is_some())
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(marked, ["state_cflow"]);
    }

    #[test]
    fn test_missing_cflow_place_is_added() {
        let mut net = StructuredNet::new("Empty");
        net.add_transition(Comment::banner("ping"));
        let merged = merge_free(&net, &retained(&["ping"]));
        assert!(merged.place_by_name("state_cflow").unwrap().init.is_some());
        assert!(merged.place_by_name("ping_cflow").unwrap().init.is_none());
    }

    #[test]
    fn test_context_merge() {
        let mut context = StructuredNet::new("Env");
        context.add_color(crate::net::Color::Defined {
            name: "ENV".to_string(),
            definition: "range 0 .. 1".to_string(),
        });
        context.add_place(Comment::banner("deposit"));
        context.add_place(Place::new("env_deposit", "ENV"));
        context.add_place(Comment::banner("withdraw"));
        context.add_place(Place::new("env_withdraw", "ENV"));
        context.add_transition(Comment::banner("deposit"));
        context.add_transition(Transition::new("call_deposit"));
        context.add_transition(Comment::banner("withdraw"));
        context.add_transition(Transition::new("call_withdraw"));

        let merged = merge_with_context(&context, &contract(), &retained(&["deposit"]));
        assert_eq!(merged.name, "Bank");
        assert_eq!(merged.num_parameters(), 1);
        assert_eq!(merged.colors().len(), 1);
        assert!(merged.place_by_name("env_deposit").is_some());
        assert!(merged.place_by_name("env_withdraw").is_none());

        let call = merged.transition_by_name("call_deposit").unwrap();
        assert!(call.input_from("state_cflow").is_some());
        assert!(call.output_to("deposit_cflow").is_some());
        let call = merged.transition_by_name("call_withdraw").unwrap();
        assert!(call.output_to("state_cflow").is_some());
        assert!(merged.transition_by_name("withdraw_start").is_none());
    }
}

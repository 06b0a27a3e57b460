//! Load-time checks of a price model graph

use std::collections::{BTreeMap, HashMap};

use super::types::{ModelError, Operator, Origin, PriceModel, PriceRef};
use crate::price::Pair;

/// Check every model, every chain and the absence of cycles
pub(crate) fn validate(models: &BTreeMap<Pair, PriceModel>) -> Result<(), ModelError> {
    for (pair, model) in models {
        if model.sources.is_empty() {
            return Err(ModelError::NoSources(pair.clone()));
        }
        if model.min_sources == 0 || model.min_sources > model.sources.len() {
            return Err(ModelError::InvalidMinSources {
                pair: pair.clone(),
                min: model.min_sources,
                available: model.sources.len(),
            });
        }

        for chain in &model.sources {
            check_chain(pair, chain)?;

            for (_, hop) in chain.hops() {
                if hop.origin == Origin::Model && !models.contains_key(&hop.pair) {
                    return Err(ModelError::UnknownModel {
                        pair: pair.clone(),
                        reference: hop.pair.clone(),
                    });
                }
            }
        }
    }

    detect_cycles(models)
}

/// Check that a chain's operators connect its hops and end at `target`
fn check_chain(target: &Pair, chain: &PriceRef) -> Result<(), ModelError> {
    let mut hops = chain.hops().into_iter();
    let mut current = match hops.next() {
        Some((_, head)) => head.pair.clone(),
        None => return Err(ModelError::EmptyChain(target.clone())),
    };

    for (operator, hop) in hops {
        let connects = match operator {
            Some(Operator::Multiply) => current.quote == hop.pair.base,
            Some(Operator::Divide) => current.base == hop.pair.base,
            _ => true,
        };
        if !connects {
            return Err(ModelError::DisconnectedHop {
                target: target.clone(),
                from: current,
                hop: hop.pair.clone(),
            });
        }

        current = match operator {
            Some(Operator::Divide) => Pair::new(current.quote.clone(), hop.pair.quote.clone()),
            _ => Pair::new(current.base.clone(), hop.pair.quote.clone()),
        };
    }

    if current != *target {
        return Err(ModelError::ChainMismatch {
            target: target.clone(),
            produced: current,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

fn detect_cycles(models: &BTreeMap<Pair, PriceModel>) -> Result<(), ModelError> {
    let mut marks = HashMap::new();
    let mut stack = Vec::new();
    for pair in models.keys() {
        visit(pair, models, &mut marks, &mut stack)?;
    }
    Ok(())
}

fn visit<'a>(
    pair: &'a Pair,
    models: &'a BTreeMap<Pair, PriceModel>,
    marks: &mut HashMap<&'a Pair, Mark>,
    stack: &mut Vec<Pair>,
) -> Result<(), ModelError> {
    match marks.get(pair) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            let start = stack.iter().position(|p| p == pair).unwrap_or(0);
            let mut cycle = stack[start..].to_vec();
            cycle.push(pair.clone());
            return Err(ModelError::Cycle(cycle));
        }
        None => {}
    }

    marks.insert(pair, Mark::Visiting);
    stack.push(pair.clone());

    if let Some(model) = models.get(pair) {
        for chain in &model.sources {
            for (_, hop) in chain.hops() {
                if hop.origin == Origin::Model {
                    visit(&hop.pair, models, marks, stack)?;
                }
            }
        }
    }

    stack.pop();
    marks.insert(pair, Mark::Done);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::Method;

    fn pair(s: &str) -> Pair {
        s.parse().unwrap()
    }

    fn model(min_sources: usize, sources: Vec<PriceRef>) -> PriceModel {
        PriceModel {
            method: Method::Median,
            min_sources,
            sources,
        }
    }

    #[test]
    fn test_valid_graph() {
        let mut models = BTreeMap::new();
        models.insert(
            pair("BTC/USD"),
            model(1, vec![PriceRef::exchange("a", pair("BTC/USD"))]),
        );
        models.insert(
            pair("ETH/USD"),
            model(
                1,
                vec![PriceRef::exchange("a", pair("ETH/BTC"))
                    .then(Operator::Multiply, PriceRef::model(pair("BTC/USD")))],
            ),
        );
        assert!(validate(&models).is_ok());
    }

    #[test]
    fn test_no_sources() {
        let mut models = BTreeMap::new();
        models.insert(pair("BTC/USD"), model(1, vec![]));
        assert_eq!(
            validate(&models),
            Err(ModelError::NoSources(pair("BTC/USD")))
        );
    }

    #[test]
    fn test_min_sources_out_of_range() {
        let mut models = BTreeMap::new();
        models.insert(
            pair("BTC/USD"),
            model(2, vec![PriceRef::exchange("a", pair("BTC/USD"))]),
        );
        assert!(matches!(
            validate(&models),
            Err(ModelError::InvalidMinSources { min: 2, available: 1, .. })
        ));

        models.insert(
            pair("BTC/USD"),
            model(0, vec![PriceRef::exchange("a", pair("BTC/USD"))]),
        );
        assert!(matches!(
            validate(&models),
            Err(ModelError::InvalidMinSources { min: 0, .. })
        ));
    }

    #[test]
    fn test_chain_mismatch() {
        let mut models = BTreeMap::new();
        models.insert(
            pair("BTC/USD"),
            model(1, vec![PriceRef::exchange("a", pair("BTC/EUR"))]),
        );
        assert!(matches!(
            validate(&models),
            Err(ModelError::ChainMismatch { .. })
        ));
    }

    #[test]
    fn test_disconnected_hop() {
        let mut models = BTreeMap::new();
        models.insert(
            pair("ETH/USD"),
            model(
                1,
                vec![PriceRef::exchange("a", pair("ETH/BTC"))
                    .then(Operator::Multiply, PriceRef::exchange("a", pair("EUR/USD")))],
            ),
        );
        assert!(matches!(
            validate(&models),
            Err(ModelError::DisconnectedHop { .. })
        ));
    }

    #[test]
    fn test_divide_chain() {
        let mut models = BTreeMap::new();
        models.insert(
            pair("BTC/USD"),
            model(
                1,
                vec![PriceRef::exchange("a", pair("ETH/BTC"))
                    .then(Operator::Divide, PriceRef::exchange("a", pair("ETH/USD")))],
            ),
        );
        assert!(validate(&models).is_ok());
    }

    #[test]
    fn test_unknown_model() {
        let mut models = BTreeMap::new();
        models.insert(
            pair("ETH/USD"),
            model(
                1,
                vec![PriceRef::exchange("a", pair("ETH/BTC"))
                    .then(Operator::Multiply, PriceRef::model(pair("BTC/USD")))],
            ),
        );
        assert_eq!(
            validate(&models),
            Err(ModelError::UnknownModel {
                pair: pair("ETH/USD"),
                reference: pair("BTC/USD"),
            })
        );
    }

    #[test]
    fn test_self_reference_is_cycle() {
        let mut models = BTreeMap::new();
        models.insert(
            pair("BTC/USD"),
            model(1, vec![PriceRef::model(pair("BTC/USD"))]),
        );
        assert_eq!(
            validate(&models),
            Err(ModelError::Cycle(vec![pair("BTC/USD"), pair("BTC/USD")]))
        );
    }

    #[test]
    fn test_indirect_cycle() {
        let mut models = BTreeMap::new();
        models.insert(
            pair("A/B"),
            model(
                1,
                vec![PriceRef::model(pair("A/C"))
                    .then(Operator::Multiply, PriceRef::exchange("x", pair("C/B")))],
            ),
        );
        models.insert(
            pair("A/C"),
            model(
                1,
                vec![PriceRef::model(pair("A/B"))
                    .then(Operator::Multiply, PriceRef::exchange("x", pair("B/C")))],
            ),
        );

        let err = validate(&models).unwrap_err();
        match err {
            ModelError::Cycle(path) => {
                assert_eq!(path.first(), path.last());
                assert!(path.contains(&pair("A/B")));
                assert!(path.contains(&pair("A/C")));
            }
            other => panic!("Expected cycle, got {other:?}"),
        }
    }
}

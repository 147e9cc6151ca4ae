use crate::model::{MatchedPair, Record};

/// Pair NBIM records with custody records by business key (isin, event_key).
///
/// Greedy, order-dependent, one-to-one: each NBIM record claims the first
/// unclaimed custody record with an equal key, in custody arrival order.
/// Extra duplicates on either side surface as unmatched pairs. This exact
/// order is a contract — downstream proposals depend on which records are
/// declared missing — so do not replace it with an "optimal" matching.
pub fn pair_by_business_key(nbim: &[Record], custody: &[Record]) -> Vec<MatchedPair> {
    let mut claimed = vec![false; custody.len()];
    let mut pairs = Vec::with_capacity(nbim.len() + custody.len());

    for (ni, n) in nbim.iter().enumerate() {
        let mut hit = None;
        for (ci, c) in custody.iter().enumerate() {
            if !claimed[ci] && c.isin == n.isin && c.event_key == n.event_key {
                hit = Some(ci);
                break;
            }
        }

        match hit {
            Some(ci) => {
                claimed[ci] = true;
                pairs.push(MatchedPair {
                    nbim: Some(n.clone()),
                    custody: Some(custody[ci].clone()),
                    nbim_index: Some(ni),
                    custody_index: Some(ci),
                });
            }
            None => pairs.push(MatchedPair {
                nbim: Some(n.clone()),
                custody: None,
                nbim_index: Some(ni),
                custody_index: None,
            }),
        }
    }

    for (ci, c) in custody.iter().enumerate() {
        if !claimed[ci] {
            pairs.push(MatchedPair {
                nbim: None,
                custody: Some(c.clone()),
                nbim_index: None,
                custody_index: Some(ci),
            });
        }
    }

    pairs
}

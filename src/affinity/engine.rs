use std::cmp::Ordering;

use crate::graph::{normalize_tag, UserSignals};

use super::dto::{AffinityRecord, SimilarityRecord};

/// Shared signals between the reference user and one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlap {
    /// In the reference user's tag order.
    pub gustos: Vec<String>,
    /// Ascending by name.
    pub hashtags: Vec<String>,
}

impl Overlap {
    pub fn score(&self) -> usize {
        self.gustos.len() + self.hashtags.len()
    }
}

/// Computes the taste and hashtag overlap of `reference` with `candidate`.
///
/// Taste tags are compared case-normalized as a set, so a tag repeated in two
/// slots counts once. Hashtags are the ones reachable through each user's posts.
pub fn overlap(reference: &UserSignals, candidate: &UserSignals) -> Overlap {
    let theirs: Vec<String> = candidate.gustos.iter().map(|g| normalize_tag(g)).collect();

    let mut gustos: Vec<String> = Vec::with_capacity(3);
    for tag in reference.gustos.iter().map(|g| normalize_tag(g)) {
        if !tag.is_empty() && theirs.contains(&tag) && !gustos.contains(&tag) {
            gustos.push(tag);
        }
    }

    let hashtags = reference
        .hashtags
        .intersection(&candidate.hashtags)
        .cloned()
        .collect();

    Overlap { gustos, hashtags }
}

/// Every user except `reference` paired with its overlap.
fn candidates<'a>(
    reference: &'a UserSignals,
    universe: &'a [UserSignals],
) -> impl Iterator<Item = (&'a UserSignals, Overlap)> + 'a {
    universe
        .iter()
        .filter(move |c| c.id != reference.id)
        .map(move |c| (c, overlap(reference, c)))
}

/// Higher score first, then candidate id ascending.
fn by_score(a_score: usize, a_id: &uuid::Uuid, b_score: usize, b_id: &uuid::Uuid) -> Ordering {
    b_score.cmp(&a_score).then_with(|| a_id.cmp(b_id))
}

/// Ranks `universe` by combined affinity with `reference`.
pub fn rank_affinity(reference: &UserSignals, universe: &[UserSignals]) -> Vec<AffinityRecord> {
    let mut ranking: Vec<AffinityRecord> = candidates(reference, universe)
        .filter(|(_, o)| o.score() > 0)
        .map(|(c, o)| AffinityRecord {
            id: c.id,
            nombre: c.nombre.clone(),
            apellidos: c.apellidos.clone(),
            num_gustos: o.gustos.len(),
            num_hashtags: o.hashtags.len(),
            puntuacion_afinidad: o.score(),
            gustos_comunes: o.gustos,
            hashtags_comunes: o.hashtags,
        })
        .collect();

    ranking.sort_by(|a, b| by_score(a.puntuacion_afinidad, &a.id, b.puntuacion_afinidad, &b.id));
    ranking
}

/// Ranks `universe` by the number of hashtags shared with `reference`.
pub fn rank_by_hashtags(
    reference: &UserSignals,
    universe: &[UserSignals],
) -> Vec<SimilarityRecord> {
    let mut ranking: Vec<SimilarityRecord> = candidates(reference, universe)
        .filter(|(_, o)| !o.hashtags.is_empty())
        .map(|(c, o)| SimilarityRecord {
            id: c.id,
            nombre: c.nombre.clone(),
            apellidos: c.apellidos.clone(),
            cantidad: o.hashtags.len(),
            hashtags_comunes: o.hashtags,
        })
        .collect();

    ranking.sort_by(|a, b| by_score(a.cantidad, &a.id, b.cantidad, &b.id));
    ranking
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use uuid::Uuid;

    use super::*;

    fn user(n: u128, gustos: [&str; 3], hashtags: &[&str]) -> UserSignals {
        UserSignals {
            id: Uuid::from_u128(n),
            nombre: format!("user{n}"),
            apellidos: "Test".into(),
            gustos: gustos.map(String::from),
            hashtags: hashtags.iter().map(|h| h.to_string()).collect::<BTreeSet<_>>(),
        }
    }

    fn scenario() -> Vec<UserSignals> {
        vec![
            user(1, ["futbol", "viajes", "musica"], &["deporte", "verano"]),
            user(2, ["futbol", "cine", "arte"], &["deporte", "tecnologia"]),
            user(3, ["cocina", "lectura", "teatro"], &["gastronomia"]),
        ]
    }

    #[test]
    fn shared_taste_and_hashtag_scores_two() {
        let users = scenario();
        let ranking = rank_affinity(&users[0], &users);

        assert_eq!(ranking.len(), 1);
        let b = &ranking[0];
        assert_eq!(b.id, Uuid::from_u128(2));
        assert_eq!(b.gustos_comunes, vec!["futbol".to_string()]);
        assert_eq!(b.hashtags_comunes, vec!["deporte".to_string()]);
        assert_eq!(b.num_gustos, 1);
        assert_eq!(b.num_hashtags, 1);
        assert_eq!(b.puntuacion_afinidad, 2);
    }

    #[test]
    fn unrelated_user_is_absent_from_both_rankings() {
        let users = scenario();
        let c = Uuid::from_u128(3);
        assert!(rank_affinity(&users[0], &users).iter().all(|r| r.id != c));
        assert!(rank_by_hashtags(&users[0], &users).iter().all(|r| r.id != c));
    }

    #[test]
    fn reference_never_ranks_itself() {
        let users = scenario();
        for u in &users {
            assert!(rank_affinity(u, &users).iter().all(|r| r.id != u.id));
            assert!(rank_by_hashtags(u, &users).iter().all(|r| r.id != u.id));
        }
    }

    #[test]
    fn score_matches_overlap_sizes() {
        let users = vec![
            user(1, ["a", "b", "c"], &["x", "y", "z"]),
            user(2, ["a", "b", "q"], &["x"]),
            user(3, ["c", "r", "s"], &["y", "z"]),
            user(4, ["t", "u", "v"], &["w"]),
        ];
        let ranking = rank_affinity(&users[0], &users);
        for r in &ranking {
            let candidate = users.iter().find(|u| u.id == r.id).unwrap();
            let o = overlap(&users[0], candidate);
            assert_eq!(r.puntuacion_afinidad, o.gustos.len() + o.hashtags.len());
            assert_eq!(r.num_gustos + r.num_hashtags, r.puntuacion_afinidad);
            assert!(r.puntuacion_afinidad > 0);
        }
        assert_eq!(ranking.len(), 2);
    }

    #[test]
    fn ranking_is_sorted_with_id_tie_break() {
        let users = vec![
            user(1, ["a", "b", "c"], &["x", "y"]),
            user(5, ["a", "q", "r"], &[]),
            user(4, ["a", "q", "r"], &[]),
            user(3, ["a", "b", "r"], &["x"]),
        ];
        let ranking = rank_affinity(&users[0], &users);
        let ids: Vec<u128> = ranking.iter().map(|r| r.id.as_u128()).collect();
        assert_eq!(ids, vec![3, 4, 5]);
        assert!(ranking
            .windows(2)
            .all(|w| w[0].puntuacion_afinidad >= w[1].puntuacion_afinidad));
    }

    #[test]
    fn taste_tags_compare_as_case_normalized_set() {
        let users = vec![
            user(1, ["Futbol", "futbol", "cine"], &[]),
            user(2, ["FUTBOL", "arte", "Cine"], &[]),
        ];
        let ranking = rank_affinity(&users[0], &users);
        assert_eq!(
            ranking[0].gustos_comunes,
            vec!["futbol".to_string(), "cine".to_string()]
        );
        assert_eq!(ranking[0].puntuacion_afinidad, 2);
    }

    #[test]
    fn hashtag_ranking_ignores_tastes() {
        let users = vec![
            user(1, ["a", "b", "c"], &["x", "y"]),
            user(2, ["a", "b", "c"], &[]),
            user(3, ["d", "e", "f"], &["y", "x"]),
            user(4, ["d", "e", "f"], &["y"]),
        ];
        let ranking = rank_by_hashtags(&users[0], &users);
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].id, Uuid::from_u128(3));
        assert_eq!(ranking[0].cantidad, 2);
        assert_eq!(
            ranking[0].hashtags_comunes,
            vec!["x".to_string(), "y".to_string()]
        );
        assert_eq!(ranking[1].id, Uuid::from_u128(4));
        assert_eq!(ranking[1].cantidad, 1);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let users = scenario();
        assert_eq!(
            rank_affinity(&users[1], &users),
            rank_affinity(&users[1], &users)
        );
        assert_eq!(
            rank_by_hashtags(&users[1], &users),
            rank_by_hashtags(&users[1], &users)
        );
    }

    #[test]
    fn records_serialize_with_wire_names() {
        let users = scenario();
        let affinity = serde_json::to_value(rank_affinity(&users[0], &users)).unwrap();
        let row = &affinity[0];
        for key in [
            "id",
            "nombre",
            "apellidos",
            "gustosComunes",
            "hashtagsComunes",
            "numGustos",
            "numHashtags",
            "puntuacionAfinidad",
        ] {
            assert!(row.get(key).is_some(), "missing {key}");
        }

        let similar = serde_json::to_value(rank_by_hashtags(&users[0], &users)).unwrap();
        assert_eq!(similar[0]["cantidad"], 1);
        assert_eq!(similar[0]["hashtagsComunes"][0], "deporte");
    }
}

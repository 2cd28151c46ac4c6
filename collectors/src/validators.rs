//! Whole-set validator metrics behind `/metrics/validators`.

use std::sync::Arc;

use client::{BondStatus, SigningInfo, Validator};
use prometheus::{GaugeVec, Registry};

use crate::{
    derived_consensus_address,
    error::Result,
    registry::{gauge_vec, render},
    sanitize::sanitize_utf8,
    ExporterContext,
};

/// Scrapes the full validator set with per-validator rank, liveness, and
/// stake figures.
pub async fn collect(ctx: Arc<ExporterContext>) -> Result<String> {
    let registry = Registry::new();
    let families = build_families(&registry, &ctx.chain_id)?;

    let (validators_res, signing_res, params_res) = tokio::join!(
        ctx.client.staking().validators(),
        ctx.client.signing_infos(),
        ctx.client.staking().params(),
    );

    let validators = validators_res.unwrap_or_else(|err| {
        tracing::error!(%err, "could not get validators");
        Vec::new()
    });
    let signing_infos = signing_res.unwrap_or_else(|err| {
        tracing::error!(%err, "could not get signing infos");
        Vec::new()
    });
    let max_validators = match params_res {
        Ok(params) => Some(params.max_validators),
        Err(err) => {
            tracing::error!(%err, "could not get staking params");
            None
        }
    };

    emit_validator_set(&ctx, &families, validators, &signing_infos, max_validators);

    render(&registry)
}

/// The gauge families of the endpoint, registered up front so that
/// partial failures still render the full exposition skeleton.
struct SetFamilies {
    commission: GaugeVec,
    status: GaugeVec,
    jailed: GaugeVec,
    tokens: GaugeVec,
    delegator_shares: GaugeVec,
    min_self_delegation: GaugeVec,
    missed_blocks: GaugeVec,
    rank: GaugeVec,
    active: GaugeVec,
}

fn build_families(registry: &Registry, chain_id: &str) -> Result<SetFamilies> {
    Ok(SetFamilies {
        commission: gauge_vec(
            registry,
            "cosmos_validators_commission",
            "Commission rate of the validator",
            &["address", "moniker"],
            chain_id,
        )?,
        status: gauge_vec(
            registry,
            "cosmos_validators_status",
            "Bond status of the validator",
            &["address", "moniker"],
            chain_id,
        )?,
        jailed: gauge_vec(
            registry,
            "cosmos_validators_jailed",
            "1 if the validator is jailed",
            &["address", "moniker"],
            chain_id,
        )?,
        tokens: gauge_vec(
            registry,
            "cosmos_validators_tokens",
            "Tokens bonded to the validator",
            &["address", "moniker", "denom"],
            chain_id,
        )?,
        delegator_shares: gauge_vec(
            registry,
            "cosmos_validators_delegator_shares",
            "Delegator shares of the validator",
            &["address", "moniker", "denom"],
            chain_id,
        )?,
        min_self_delegation: gauge_vec(
            registry,
            "cosmos_validators_min_self_delegation",
            "Minimum self-delegation of the validator",
            &["address", "moniker", "denom"],
            chain_id,
        )?,
        missed_blocks: gauge_vec(
            registry,
            "cosmos_validators_missed_blocks",
            "Missed blocks of the validator",
            &["address", "moniker"],
            chain_id,
        )?,
        rank: gauge_vec(
            registry,
            "cosmos_validators_rank",
            "Rank of the validator by delegator shares",
            &["address", "moniker"],
            chain_id,
        )?,
        active: gauge_vec(
            registry,
            "cosmos_validators_active",
            "1 if the validator is in the active set",
            &["address", "moniker"],
            chain_id,
        )?,
    })
}

/// The post-barrier pass: sorts the set and writes every per-validator
/// gauge. `max_validators` is `None` when the params query failed, which
/// leaves the active family absent; a genuine 0 marks everyone inactive.
fn emit_validator_set(
    ctx: &ExporterContext,
    families: &SetFamilies,
    mut validators: Vec<Validator>,
    signing_infos: &[SigningInfo],
    max_validators: Option<u32>,
) {
    sort_by_shares(&mut validators);

    for (index, validator) in validators.iter().enumerate() {
        let moniker = sanitize_utf8(validator.moniker.as_bytes());
        let labels = [validator.operator_address.as_str(), moniker.as_str()];
        let denom_labels = [
            validator.operator_address.as_str(),
            moniker.as_str(),
            ctx.denom.as_str(),
        ];

        families
            .commission
            .with_label_values(&labels)
            .set(validator.commission_rate.to_f64());
        families
            .status
            .with_label_values(&labels)
            .set(validator.status.code() as f64);
        families
            .jailed
            .with_label_values(&labels)
            .set(if validator.jailed { 1.0 } else { 0.0 });
        families
            .tokens
            .with_label_values(&denom_labels)
            .set(ctx.scale(&validator.tokens));
        families
            .delegator_shares
            .with_label_values(&denom_labels)
            .set(ctx.scale(&validator.delegator_shares));
        families
            .min_self_delegation
            .with_label_values(&denom_labels)
            .set(ctx.scale(&validator.min_self_delegation));

        match find_signing_info(ctx, validator, signing_infos) {
            Some(info) if validator.status == BondStatus::Bonded => {
                families
                    .missed_blocks
                    .with_label_values(&labels)
                    .set(info.missed_blocks as f64);
            }
            Some(_) => {
                tracing::trace!(
                    address = %validator.operator_address,
                    "validator is not active, omitting missed blocks"
                );
            }
            None => {
                tracing::debug!(
                    address = %validator.operator_address,
                    "no signing info for validator"
                );
            }
        }

        families
            .rank
            .with_label_values(&labels)
            .set((index + 1) as f64);

        if let Some(max_validators) = max_validators {
            let in_set = index < max_validators as usize;
            families
                .active
                .with_label_values(&labels)
                .set(if in_set { 1.0 } else { 0.0 });
        }
    }
}

/// Descending by delegator shares; a stable sort keeps the upstream
/// order for equal stakes.
pub(crate) fn sort_by_shares(validators: &mut [Validator]) {
    validators.sort_by(|a, b| b.delegator_shares.cmp(&a.delegator_shares));
}

fn find_signing_info<'a>(
    ctx: &ExporterContext,
    validator: &Validator,
    infos: &'a [SigningInfo],
) -> Option<&'a SigningInfo> {
    let pubkey = validator.consensus_pubkey.as_ref()?;
    let cons_address = derived_consensus_address(ctx, pubkey)?;
    infos.iter().find(|info| info.address == cons_address)
}

#[cfg(test)]
mod tests {
    use client::{bech, ConsensusPubkey, Decimal, NetworkType, NodeClient, TendermintClient};
    use pretty_assertions::assert_eq;
    use tonic::transport::Channel;

    use crate::BechPrefixes;

    use super::*;

    fn validator(address: &str, shares: &str) -> Validator {
        Validator {
            operator_address: address.to_string(),
            moniker: address.to_string(),
            consensus_pubkey: None,
            jailed: false,
            status: BondStatus::Bonded,
            tokens: Decimal::zero(),
            delegator_shares: Decimal::parse(shares).unwrap(),
            min_self_delegation: Decimal::zero(),
            commission_rate: Decimal::zero(),
        }
    }

    fn test_context() -> ExporterContext {
        let channel = Channel::from_static("http://127.0.0.1:1").connect_lazy();
        let tendermint = TendermintClient::new("http://127.0.0.1:1".parse().unwrap()).unwrap();
        ExporterContext {
            client: NodeClient::new(channel, NetworkType::Cosmos, tendermint, 1000),
            chain_id: "test-1".to_string(),
            denom: "atom".to_string(),
            denom_coefficient: 1.0,
            prefixes: BechPrefixes::from_base("cosmos"),
        }
    }

    #[test]
    fn sorts_descending_by_shares() {
        let mut set = vec![
            validator("val-small", "10"),
            validator("val-big", "900"),
            validator("val-mid", "55.5"),
        ];
        sort_by_shares(&mut set);
        let order: Vec<_> = set.iter().map(|v| v.operator_address.as_str()).collect();
        assert_eq!(order, ["val-big", "val-mid", "val-small"]);
    }

    #[test]
    fn equal_shares_keep_upstream_order() {
        let mut set = vec![
            validator("val-a", "100"),
            validator("val-b", "100"),
            validator("val-c", "200"),
        ];
        sort_by_shares(&mut set);
        let order: Vec<_> = set.iter().map(|v| v.operator_address.as_str()).collect();
        assert_eq!(order, ["val-c", "val-a", "val-b"]);
    }

    #[tokio::test]
    async fn ranks_and_active_follow_the_sorted_order() {
        let ctx = test_context();
        let registry = Registry::new();
        let families = build_families(&registry, &ctx.chain_id).unwrap();
        let set = vec![
            validator("val-a", "500"),
            validator("val-b", "700"),
            validator("val-c", "700"),
        ];

        emit_validator_set(&ctx, &families, set, &[], Some(2));

        let rank_of = |addr: &str| families.rank.with_label_values(&[addr, addr]).get();
        assert_eq!(rank_of("val-b"), 1.0);
        assert_eq!(rank_of("val-c"), 2.0);
        assert_eq!(rank_of("val-a"), 3.0);

        let active_of = |addr: &str| families.active.with_label_values(&[addr, addr]).get();
        assert_eq!(active_of("val-b"), 1.0);
        assert_eq!(active_of("val-c"), 1.0);
        assert_eq!(active_of("val-a"), 0.0);
    }

    #[tokio::test]
    async fn zero_max_validators_marks_everyone_inactive() {
        let ctx = test_context();
        let registry = Registry::new();
        let families = build_families(&registry, &ctx.chain_id).unwrap();

        emit_validator_set(&ctx, &families, vec![validator("val-a", "500")], &[], Some(0));

        let body = render(&registry).unwrap();
        assert!(
            body.contains(
                r#"cosmos_validators_active{address="val-a",chain_id="test-1",moniker="val-a"} 0"#
            ),
            "{body}"
        );
    }

    #[tokio::test]
    async fn active_family_is_absent_without_params() {
        let ctx = test_context();
        let registry = Registry::new();
        let families = build_families(&registry, &ctx.chain_id).unwrap();

        emit_validator_set(&ctx, &families, vec![validator("val-a", "500")], &[], None);

        let body = render(&registry).unwrap();
        assert!(!body.contains("cosmos_validators_active{"), "{body}");
        assert!(body.contains("cosmos_validators_rank{"), "{body}");
    }

    #[tokio::test]
    async fn missed_blocks_require_bonded_status_and_matched_signing_info() {
        let ctx = test_context();
        let registry = Registry::new();
        let families = build_families(&registry, &ctx.chain_id).unwrap();

        let pubkey = ConsensusPubkey::Ed25519(vec![7u8; 32]);
        let cons_address =
            bech::encode("cosmosvalcons", &pubkey.consensus_address().unwrap()).unwrap();
        let mut bonded = validator("val-live", "900");
        bonded.consensus_pubkey = Some(pubkey.clone());
        let mut unbonded = validator("val-idle", "100");
        unbonded.consensus_pubkey = Some(pubkey);
        unbonded.status = BondStatus::Unbonded;
        let infos = vec![SigningInfo {
            address: cons_address,
            missed_blocks: 12,
        }];

        emit_validator_set(&ctx, &families, vec![bonded, unbonded], &infos, None);

        let body = render(&registry).unwrap();
        assert!(
            body.contains(
                r#"cosmos_validators_missed_blocks{address="val-live",chain_id="test-1",moniker="val-live"} 12"#
            ),
            "{body}"
        );
        assert!(
            !body.contains(r#"cosmos_validators_missed_blocks{address="val-idle""#),
            "{body}"
        );
    }
}

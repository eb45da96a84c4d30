//! Bounty office node: pay off or talk down the bounty on your head in the
//! current region.

use game_context::{Attribute, GameContext};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::action::Action;
use crate::error::Result;
use crate::input::Input;
use crate::node::{Node, NodeCore, Resolution};
use crate::persistence::{RecordReader, RecordWriter};
use crate::transition::TransitionTag;

/// Input kind handled by [`BountyOfficeNode`].
pub const BOUNTY_ACTION: &str = "bounty_action";

const BASE_DISCOUNT_PERCENT: i32 = 10;
const MIN_DISCOUNT_PERCENT: i32 = 5;
const MAX_DISCOUNT_PERCENT: i32 = 50;

/// Outstanding bounties per region.
///
/// `pay_full` follows the `Success` rule when the gold is paid and the
/// `Failure` rule when the purse is too light. Each region's bounty can be
/// negotiated down once.
#[derive(Debug)]
pub struct BountyOfficeNode {
    core: NodeCore,
    bounties: BTreeMap<String, u32>,
    negotiated: BTreeSet<String>,
}

impl BountyOfficeNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            core: NodeCore::new(name),
            bounties: BTreeMap::new(),
            negotiated: BTreeSet::new(),
        }
    }

    pub fn with_bounty(mut self, region: impl Into<String>, amount: u32) -> Self {
        self.add_bounty(region, amount);
        self
    }

    pub fn add_bounty(&mut self, region: impl Into<String>, amount: u32) {
        let entry = self.bounties.entry(region.into()).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    pub fn bounty(&self, region: &str) -> u32 {
        self.bounties.get(region).copied().unwrap_or(0)
    }

    pub fn has_negotiated(&self, region: &str) -> bool {
        self.negotiated.contains(region)
    }

    /// Discount offered to this character, in percent.
    pub fn discount_percent(ctx: &GameContext) -> i32 {
        let stats = &ctx.player_stats;
        let percent = BASE_DISCOUNT_PERCENT
            .saturating_add(stats.modifier(Attribute::Charisma).saturating_mul(5))
            .saturating_add(stats.skill("persuasion").saturating_mul(2));
        percent.clamp(MIN_DISCOUNT_PERCENT, MAX_DISCOUNT_PERCENT)
    }

    /// Returns whether the bounty is now clear.
    fn pay_full(&mut self, ctx: &mut GameContext) -> bool {
        let region = ctx.current_region().to_string();
        let bounty = self.bounty(&region);

        match ctx.spend_gold(bounty) {
            Ok(()) => {
                self.bounties.remove(&region);
                self.negotiated.remove(&region);
                info!(%region, bounty, "bounty paid");
                if bounty > 0 {
                    ctx.narrate(format!("You've paid your bounty of {bounty} gold."));
                    ctx.narrate(format!("Your criminal record in {region} has been cleared."));
                } else {
                    ctx.narrate(format!("You have no bounty in {region}."));
                }
                true
            }
            Err(_) => {
                debug!(%region, bounty, gold = ctx.gold(), "cannot afford bounty");
                ctx.narrate("You don't have enough gold to pay your bounty.");
                false
            }
        }
    }

    fn negotiate(&mut self, ctx: &mut GameContext) {
        let region = ctx.current_region().to_string();
        let bounty = self.bounty(&region);

        if bounty == 0 {
            ctx.narrate("There is nothing to negotiate.");
            return;
        }
        if self.negotiated.contains(&region) {
            ctx.narrate("\"You've had your discount. Pay up or get out.\"");
            return;
        }

        let percent = Self::discount_percent(ctx);
        let reduced = u64::from(bounty) * u64::try_from(100 - percent).unwrap_or(0) / 100;
        let reduced = u32::try_from(reduced).unwrap_or(bounty);
        self.bounties.insert(region.clone(), reduced);
        self.negotiated.insert(region.clone());

        info!(%region, from = bounty, to = reduced, percent, "bounty negotiated");
        ctx.narrate(format!(
            "Through skillful negotiation, you've reduced your bounty from {bounty} to {reduced} gold."
        ));
    }
}

impl Node for BountyOfficeNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        "bounty_office"
    }

    fn on_enter(&mut self, ctx: &mut GameContext) {
        let region = ctx.current_region().to_string();
        let bounty = self.bounty(&region);
        ctx.narrate(format!("You are at the bounty office in {region}."));
        ctx.narrate(format!("Your current bounty is {bounty} gold."));
    }

    fn available_actions(&self, ctx: &GameContext) -> Vec<Action> {
        let region = ctx.current_region();
        let bounty = self.bounty(region);

        let mut actions = vec![Action::emitting(
            "pay_full",
            format!("Pay full bounty ({bounty} gold)"),
            Input::action(BOUNTY_ACTION, "pay_full"),
        )];
        if bounty > 0 && !self.has_negotiated(region) {
            actions.push(Action::emitting(
                "negotiate",
                "Attempt to negotiate",
                Input::action(BOUNTY_ACTION, "negotiate"),
            ));
        }
        actions.push(Action::emitting(
            "leave",
            "Leave bounty office",
            Input::action(BOUNTY_ACTION, "leave"),
        ));
        actions
    }

    fn evaluate_transition(&mut self, input: &Input, ctx: &mut GameContext) -> Resolution {
        if input.is(BOUNTY_ACTION) {
            match input.param_str("action") {
                Some("pay_full") => {
                    let tag = if self.pay_full(ctx) {
                        TransitionTag::Success
                    } else {
                        TransitionTag::Failure
                    };
                    return self
                        .core
                        .target_for(&tag)
                        .map_or(Resolution::Stay, Resolution::MoveTo);
                }
                Some("negotiate") => {
                    self.negotiate(ctx);
                    return Resolution::Stay;
                }
                Some("leave") => {
                    if let Some(target) = self.core.target_for(&TransitionTag::Exit) {
                        return Resolution::MoveTo(target);
                    }
                }
                _ => {}
            }
        }
        self.core.match_rules(input).into()
    }

    fn save_state(&self, out: &mut RecordWriter) -> Result<()> {
        out.write_count("bounty count", self.bounties.len())?;
        for (region, amount) in &self.bounties {
            out.write_key("region name", region)?;
            out.write_u32(*amount)?;
        }
        out.write_count("negotiated count", self.negotiated.len())?;
        for region in &self.negotiated {
            out.write_key("region name", region)?;
        }
        Ok(())
    }

    fn load_state(&mut self, input: &mut RecordReader<&[u8]>) -> Result<()> {
        let count = input.read_count("bounty count")?;
        let mut bounties = BTreeMap::new();
        for _ in 0..count {
            let region = input.read_key("region name")?;
            bounties.insert(region, input.read_u32("bounty amount")?);
        }

        let count = input.read_count("negotiated count")?;
        let mut negotiated = BTreeSet::new();
        for _ in 0..count {
            negotiated.insert(input.read_key("region name")?);
        }

        self.bounties = bounties;
        self.negotiated = negotiated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PersistenceConfig;
    use crate::node::NodeId;
    use crate::transition::{guard, TransitionRule};
    use game_context::{Item, GOLD};

    const CLEARED: NodeId = NodeId(1);
    const JAILED: NodeId = NodeId(2);
    const STREET: NodeId = NodeId(3);

    fn office() -> BountyOfficeNode {
        let mut node = BountyOfficeNode::new("Bounty Office").with_bounty("Riverwood", 100);
        let core = node.core_mut();
        core.add_rule(
            TransitionRule::new(guard::never(), CLEARED, "payment accepted")
                .with_tag(TransitionTag::Success),
        );
        core.add_rule(
            TransitionRule::new(guard::never(), JAILED, "payment refused")
                .with_tag(TransitionTag::Failure),
        );
        core.add_rule(
            TransitionRule::new(guard::never(), STREET, "leave").with_tag(TransitionTag::Exit),
        );
        node
    }

    fn context_with_gold(gold: u32) -> GameContext {
        let mut ctx = GameContext::new();
        ctx.set_current_region("Riverwood");
        if gold > 0 {
            ctx.inventory.add_item(Item::new(GOLD, "Gold", "currency", 1, gold));
        }
        ctx
    }

    fn send(node: &mut BountyOfficeNode, ctx: &mut GameContext, action: &str) -> Resolution {
        node.evaluate_transition(&Input::action(BOUNTY_ACTION, action), ctx)
    }

    #[test]
    fn test_pay_full_success() {
        let mut node = office();
        let mut ctx = context_with_gold(150);

        assert_eq!(send(&mut node, &mut ctx, "pay_full"), Resolution::MoveTo(CLEARED));
        assert_eq!(ctx.gold(), 50);
        assert_eq!(node.bounty("Riverwood"), 0);
    }

    #[test]
    fn test_pay_full_failure_keeps_gold_and_bounty() {
        let mut node = office();
        let mut ctx = context_with_gold(40);

        assert_eq!(send(&mut node, &mut ctx, "pay_full"), Resolution::MoveTo(JAILED));
        assert_eq!(ctx.gold(), 40);
        assert_eq!(node.bounty("Riverwood"), 100);
    }

    #[test]
    fn test_negotiate_once() {
        let mut node = office();
        let mut ctx = context_with_gold(0);
        let percent = BountyOfficeNode::discount_percent(&ctx);

        assert_eq!(send(&mut node, &mut ctx, "negotiate"), Resolution::Stay);
        let reduced = node.bounty("Riverwood");
        assert_eq!(reduced, 100 - percent as u32);

        send(&mut node, &mut ctx, "negotiate");
        assert_eq!(node.bounty("Riverwood"), reduced);
    }

    #[test]
    fn test_charisma_improves_discount() {
        let mut ctx = GameContext::new();
        let base = BountyOfficeNode::discount_percent(&ctx);
        ctx.player_stats.charisma = 16;
        ctx.player_stats.improve_skill("persuasion", 3);
        assert!(BountyOfficeNode::discount_percent(&ctx) > base);

        ctx.player_stats.improve_skill("persuasion", 100);
        assert_eq!(BountyOfficeNode::discount_percent(&ctx), MAX_DISCOUNT_PERCENT);
    }

    #[test]
    fn test_extreme_stats_clamp_discount() {
        let mut ctx = GameContext::new();
        ctx.player_stats.charisma = i32::MAX;
        ctx.player_stats.improve_skill("persuasion", i32::MAX);
        assert_eq!(BountyOfficeNode::discount_percent(&ctx), MAX_DISCOUNT_PERCENT);

        ctx.player_stats.charisma = i32::MIN;
        ctx.player_stats.skills.insert("persuasion".into(), i32::MIN);
        assert_eq!(BountyOfficeNode::discount_percent(&ctx), MIN_DISCOUNT_PERCENT);
    }

    #[test]
    fn test_leave_and_fallback() {
        let mut node = office();
        let mut ctx = context_with_gold(0);

        assert_eq!(send(&mut node, &mut ctx, "leave"), Resolution::MoveTo(STREET));
        assert_eq!(send(&mut node, &mut ctx, "bribe"), Resolution::Unhandled);
        assert_eq!(
            node.evaluate_transition(&Input::new("look"), &mut ctx),
            Resolution::Unhandled
        );
    }

    #[test]
    fn test_actions_hide_spent_negotiation() {
        let mut node = office();
        let mut ctx = context_with_gold(0);
        let ids = |n: &BountyOfficeNode, ctx: &GameContext| {
            n.available_actions(ctx)
                .into_iter()
                .map(|a| a.id)
                .collect::<Vec<_>>()
        };

        assert_eq!(ids(&node, &ctx), ["pay_full", "negotiate", "leave"]);
        send(&mut node, &mut ctx, "negotiate");
        assert_eq!(ids(&node, &ctx), ["pay_full", "leave"]);
    }

    #[test]
    fn test_state_round_trip() {
        let mut node = office().with_bounty("Ironforge", 25);
        let mut ctx = context_with_gold(0);
        send(&mut node, &mut ctx, "negotiate");

        let mut w = RecordWriter::new(PersistenceConfig::default());
        node.save_state(&mut w).unwrap();
        let bytes = w.into_bytes();

        let mut restored = BountyOfficeNode::new("Bounty Office");
        let mut r = RecordReader::new(bytes.as_slice(), PersistenceConfig::default());
        restored.load_state(&mut r).unwrap();

        assert!(r.is_exhausted());
        assert_eq!(restored.bounty("Riverwood"), node.bounty("Riverwood"));
        assert_eq!(restored.bounty("Ironforge"), 25);
        assert!(restored.has_negotiated("Riverwood"));
    }
}

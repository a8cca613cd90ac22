//! CLI commands for the ledger
//!
//! Thin external layer: every handler maps core results to terminal output.

use crate::config::ChainConfig;
use crate::core::{Block, Ledger};
use crate::node::{MineOutcome, Node};
use crate::storage::{load_chain, save_chain};
use crate::wallet::Wallet;
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Load the chain file at `path` and rebuild a validated ledger from it
fn load_validated(path: &Path, config: &ChainConfig) -> CliResult<Ledger> {
    let blocks = load_chain(path)?;
    Ok(Ledger::from_chain(config.clone(), blocks)?)
}

/// Generate a new key pair
pub fn cmd_keygen() -> CliResult<()> {
    let wallet = Wallet::new();

    println!("🔐 New key pair generated!");
    println!("   📍 Address: {}", wallet.address());
    println!("   🔑 Private key: {}", wallet.private_key());
    println!("\n   ⚠️  Keys are not stored anywhere. Copy the private key now.");

    Ok(())
}

/// Validate a chain file block by block
pub fn cmd_validate(path: &Path, config: &ChainConfig) -> CliResult<()> {
    println!("🔍 Validating chain {:?}...", path);

    match load_validated(path, config) {
        Ok(ledger) => {
            let stats = ledger.stats();
            println!("✅ Chain is valid!");
            println!("   ├─ Blocks: {}", stats.length);
            println!("   ├─ Transactions: {}", stats.total_transactions);
            println!("   ├─ Pending: {}", stats.pending_transactions);
            println!("   ├─ Accounts: {}", stats.accounts);
            println!("   ├─ Difficulty: {}", stats.difficulty);
            println!("   ├─ Total coins: {}", stats.total_supply);
            println!("   └─ Tip: {}", stats.latest_hash);
            Ok(())
        }
        Err(e) => {
            println!("❌ Chain validation FAILED!");
            println!("   {}", e);
            Err(e)
        }
    }
}

/// Resolve a local chain file against candidate chain files
pub fn cmd_resolve(
    local: &Path,
    candidates: &[PathBuf],
    output: Option<&Path>,
    config: &ChainConfig,
) -> CliResult<()> {
    let mut ledger = load_validated(local, config)?;
    println!("⛓️  Local chain: {} blocks", ledger.length());

    let mut chains = Vec::with_capacity(candidates.len());
    for path in candidates {
        let blocks = load_chain(path)?;
        println!("   Candidate {:?}: {} blocks", path, blocks.len());
        chains.push(blocks);
    }

    let resolution = crate::core::resolve(&mut ledger, chains);

    for rejected in &resolution.rejected {
        println!("   ❌ {}", rejected);
    }
    if resolution.replaced {
        println!("🔄 Adopted a longer chain: {} blocks", resolution.length);
    } else {
        println!("✅ Local chain is authoritative ({} blocks)", resolution.length);
    }

    if let Some(path) = output {
        save_chain(path, ledger.blocks())?;
        println!("📦 Resolved chain written to {:?}", path);
    }

    Ok(())
}

/// Show the confirmed balance of an address on a chain file
pub fn cmd_balance(path: &Path, address: &str, config: &ChainConfig) -> CliResult<()> {
    let ledger = load_validated(path, config)?;

    println!("💰 Balance for {}", address);
    println!("   Total: {} coins", ledger.balance_of(address));

    Ok(())
}

fn print_mined(label: &str, outcome: &MineOutcome) {
    match outcome {
        MineOutcome::Mined { block, stats } => {
            println!("\n   [{}] Block {} mined!", label, block.index);
            println!("   ├─ Hash: {}", &block.hash[..16]);
            println!("   ├─ Transactions: {}", block.tx_count());
            println!("   ├─ Reward: {}", block.mining_reward());
            println!("   ├─ Time: {}ms", stats.time_ms);
            println!("   ├─ Attempts: {}", stats.hash_attempts);
            println!("   └─ Hash rate: {:.2} H/s", stats.hash_rate);
        }
        MineOutcome::NoBlockProduced => println!("\n   [{}] No block produced", label),
    }
}

async fn mine_blocks(node: &Node, label: &str, address: &str, count: u32) -> CliResult<Vec<Block>> {
    let mut blocks = Vec::new();
    for _ in 0..count {
        let outcome = node.mine(address).await?;
        print_mined(label, &outcome);
        if let MineOutcome::Mined { block, .. } = outcome {
            blocks.push(block);
        }
    }
    Ok(blocks)
}

/// Two nodes mine independently, then reconcile by consensus
pub async fn cmd_demo(config: ChainConfig, export: Option<&Path>) -> CliResult<()> {
    let alice = Wallet::with_label("alice");
    let bob = Wallet::with_label("bob");
    let carol = Wallet::with_label("carol");

    let node_a = Node::new(config.clone())?;
    let node_b = Node::new(config.clone())?;

    println!("⛏️  Two nodes mining at difficulty {}", config.difficulty);
    println!("   alice: {}", alice.address());
    println!("   bob:   {}", bob.address());
    println!("   carol: {}", carol.address());

    // node A: alice earns a reward and pays bob
    mine_blocks(&node_a, "A", &alice.address(), 1).await?;
    let tx = alice.pay(&bob.address(), 20)?;
    let id = node_a.submit_transaction(tx).await?;
    println!("\n📤 alice -> bob 20 coins pending as {}", &id[..16]);
    mine_blocks(&node_a, "A", &alice.address(), 1).await?;

    // node B: carol mines a longer chain at the same time as A
    let (bob_address, carol_address) = (bob.address(), carol.address());
    let (extra_a, extra_b) = tokio::join!(
        mine_blocks(&node_a, "A", &bob_address, 1),
        mine_blocks(&node_b, "B", &carol_address, 4),
    );
    extra_a?;
    extra_b?;

    println!("\n⛓️  Node A: {} blocks, node B: {} blocks", node_a.length().await, node_b.length().await);
    for (name, wallet) in [("alice", &alice), ("bob", &bob), ("carol", &carol)] {
        println!("   A sees {} = {} coins", name, node_a.get_balance(&wallet.address()).await);
    }

    if let Some(dir) = export {
        std::fs::create_dir_all(dir)?;
        save_chain(&dir.join("node_a.json"), &node_a.get_chain().await)?;
        save_chain(&dir.join("node_b.json"), &node_b.get_chain().await)?;
        println!("\n📦 Chains exported to {:?}", dir);
    }

    let resolution = node_a.resolve_consensus(vec![node_b.get_chain().await]).await;
    if resolution.replaced {
        println!("\n🔄 Node A adopted node B's chain ({} blocks)", resolution.length);
    } else {
        println!("\n✅ Node A kept its chain ({} blocks)", resolution.length);
    }

    for (name, wallet) in [("alice", &alice), ("bob", &bob), ("carol", &carol)] {
        println!("   A sees {} = {} coins", name, node_a.get_balance(&wallet.address()).await);
    }
    println!("   Pending on A: {}", node_a.pending_transactions().await.len());

    node_a.validate_chain().await?;
    node_b.validate_chain().await?;
    println!("\n✅ Both chains validate");

    node_a.shutdown();
    node_b.shutdown();
    Ok(())
}

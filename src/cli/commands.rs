//! CLI commands for a trust-gate deployment
//!
//! Implements all command handlers for the CLI interface. Every command that
//! changes state loads the snapshot, applies one operation and saves it back.

use crate::core::{Address, EventKind};
use crate::crypto::{encode_call_from_strings, KeyPair, Signature};
use crate::deployment::{Deployment, DeploymentConfig};
use crate::multisig::ProposalStatus;
use crate::storage::{Storage, StorageConfig};
use crate::verifier::{ResourceId, COMMIT};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub deployment: Deployment,
    pub storage: Storage,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load the saved deployment
    pub fn new(data_dir: PathBuf) -> CliResult<Self> {
        let storage = Storage::new(StorageConfig {
            data_dir: data_dir.clone(),
            ..Default::default()
        })?;
        let deployment = storage.load()?;

        Ok(Self {
            deployment,
            storage,
            data_dir,
        })
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        self.storage.save(&self.deployment)?;
        Ok(())
    }
}

/// Parse a comma-separated list
pub fn parse_list<T>(input: &str) -> CliResult<Vec<T>>
where
    T: FromStr,
    T::Err: std::error::Error + 'static,
{
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<T>().map_err(|e| Box::new(e) as Box<dyn std::error::Error>))
        .collect()
}

/// Options for `init`
pub struct InitOptions<'a> {
    pub config: Option<&'a Path>,
    pub deployer: Option<&'a str>,
    pub committee: Option<&'a str>,
    pub threshold: Option<usize>,
    pub arity: Option<usize>,
    pub force: bool,
}

/// Deploy a fresh set of components
pub fn cmd_init(data_dir: &Path, opts: InitOptions<'_>) -> CliResult<()> {
    let storage = Storage::new(StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    })?;

    if storage.exists() && !opts.force {
        println!("⚠️  Deployment already exists at {:?}", data_dir);
        println!("   Use --force to reinitialize (this will delete existing data)");
        return Ok(());
    }

    let mut config = match opts.config {
        Some(path) => DeploymentConfig::from_file(path)?,
        None => {
            let deployer = opts.deployer.ok_or("--deployer is required without --config")?;
            let committee = opts.committee.ok_or("--committee is required without --config")?;
            let threshold = opts.threshold.ok_or("--threshold is required without --config")?;
            DeploymentConfig::new(deployer.parse::<Address>()?, parse_list(committee)?, threshold)
        }
    };
    if let Some(arity) = opts.arity {
        config = config.with_arity(arity);
    }

    let deployment = Deployment::new(config)?;
    storage.delete()?;
    storage.save(&deployment)?;

    let addresses = deployment.addresses();
    println!("✅ Deployment initialized!");
    println!("   📁 Data directory: {:?}", data_dir);
    println!("   👥 Committee: {}", deployment.multisig().committee().description());
    println!("   🔐 Multisig:  {}", addresses.multisig);
    println!("   📋 Registry:  {}", addresses.registry);
    println!("   ✍️  Verifier:  {} (arity {})", addresses.verifier, deployment.verifier().arity());
    println!("   📊 Ledger:    {}", addresses.stats);

    Ok(())
}

/// Generate a new key pair
pub fn cmd_keygen() -> CliResult<()> {
    let key = KeyPair::generate();

    println!("🔐 New key pair generated!");
    println!("   📍 Address: {}", key.address());
    println!("   🔑 Public Key: {}...", &key.public_key_hex()[..32]);
    println!("   🗝️  Private Key: {}", key.private_key_hex());
    println!("\n   ⚠️  IMPORTANT: The private key is not stored anywhere. Keep it safe!");

    Ok(())
}

/// Show the address of a private key
pub fn cmd_address(private_key: &str) -> CliResult<()> {
    let key = KeyPair::from_private_key_hex(private_key)?;
    println!("📍 {}", key.address());
    Ok(())
}

/// Show deployment overview and storage statistics
pub fn cmd_info(state: &AppState) -> CliResult<()> {
    let d = &state.deployment;
    let stats = state.storage.stats()?;

    println!("🏛️  Deployment Info");
    println!("   ├─ Deployer: {}", d.deployer());
    println!("   ├─ Created: {}", d.created_at().format("%Y-%m-%d %H:%M:%S"));
    println!("   ├─ Committee: {}", d.multisig().committee().description());
    println!("   ├─ Proposals: {}", d.multisig().transaction_count());
    println!("   ├─ Tracked participant sets: {}", d.verifier().nonces().len());
    println!("   ├─ Recorded matches: {}", d.ledger().matches().len());
    println!("   ├─ Collections: {}", d.collections().count());
    println!("   ├─ Snapshot size: {} bytes", stats.file_size);
    println!("   └─ Backups: {}", stats.backup_count);

    Ok(())
}

/// Submit a multisig proposal
///
/// The payload is either raw hex or built from a function signature and
/// its arguments. The target defaults to the registry.
pub fn cmd_multisig_submit(
    state: &mut AppState,
    from: &str,
    target: Option<&str>,
    call: Option<&str>,
    args: &[String],
    payload: Option<&str>,
    value: u128,
) -> CliResult<()> {
    let caller: Address = from.parse()?;
    let target = match target {
        Some(t) => t.parse::<Address>()?,
        None => state.deployment.registry().address(),
    };
    let payload = match (call, payload) {
        (Some(signature), None) => encode_call_from_strings(signature, args)?,
        (None, Some(raw)) => hex::decode(raw.trim_start_matches("0x"))?,
        (None, None) => Vec::new(),
        (Some(_), Some(_)) => return Err("use either --call or --payload, not both".into()),
    };

    let index = state.deployment.submit(caller, target, payload, value)?;
    state.save()?;

    println!("📝 Proposal #{} submitted", index);
    println!("   Target: {}", target);
    println!("   Confirm with: trustgate multisig confirm --from <signer> --index {}", index);

    Ok(())
}

/// Confirm a multisig proposal
pub fn cmd_multisig_confirm(state: &mut AppState, from: &str, index: u64) -> CliResult<()> {
    let caller: Address = from.parse()?;
    state.deployment.confirm(caller, index)?;
    state.save()?;

    let multisig = state.deployment.multisig();
    println!(
        "✅ Proposal #{} confirmed by {} ({}/{})",
        index,
        caller.short(),
        multisig.confirmation_count(index)?,
        multisig.threshold()
    );

    Ok(())
}

/// Execute a multisig proposal
pub fn cmd_multisig_execute(state: &mut AppState, from: &str, index: u64) -> CliResult<()> {
    let caller: Address = from.parse()?;
    let executed = |d: &Deployment| d.transaction(index).map_or(false, |tx| tx.is_executed());

    let before = executed(&state.deployment);
    let outcome = state.deployment.execute(caller, index);

    // A failed forward still consumes the proposal
    if !before && executed(&state.deployment) {
        state.save()?;
    }

    outcome?;
    println!("🚀 Proposal #{} executed", index);
    Ok(())
}

/// Show one multisig proposal
pub fn cmd_multisig_show(state: &AppState, index: u64) -> CliResult<()> {
    let multisig = state.deployment.multisig();
    let tx = multisig
        .transaction(index)
        .ok_or_else(|| format!("Proposal #{} not found", index))?;

    println!("📄 Proposal #{}", tx.index);
    println!("   ├─ Target: {}", tx.target);
    println!("   ├─ Payload: 0x{}", hex::encode(&tx.payload));
    println!("   ├─ Value: {}", tx.value);
    println!("   ├─ Submitted by: {}", tx.submitted_by);
    println!("   ├─ Status: {:?}", tx.status(multisig.threshold()));
    println!(
        "   ├─ Confirmations: {}/{}",
        tx.confirmation_count(),
        multisig.threshold()
    );
    for signer in tx.confirmations() {
        println!("   │  └─ {}", signer);
    }
    match &tx.execution_error {
        Some(err) => println!("   └─ Forwarded call failed: {}", err),
        None => println!("   └─ Submitted at: {}", tx.submitted_at.format("%Y-%m-%d %H:%M:%S")),
    }

    Ok(())
}

/// List multisig proposals
pub fn cmd_multisig_list(state: &AppState, pending_only: bool) -> CliResult<()> {
    let multisig = state.deployment.multisig();
    let threshold = multisig.threshold();

    let txs: Vec<_> = multisig
        .transactions()
        .iter()
        .filter(|tx| !pending_only || !tx.is_executed())
        .collect();

    if txs.is_empty() {
        println!("📭 No proposals found.");
        return Ok(());
    }

    println!("📋 Proposals ({}):", txs.len());
    for tx in txs {
        let icon = match tx.status(threshold) {
            ProposalStatus::AwaitingConfirmations => "⏳",
            ProposalStatus::Executable => "🟢",
            ProposalStatus::Executed => "✔️ ",
        };
        println!(
            "   {} #{} → {} | {}/{} confirmations",
            icon,
            tx.index,
            tx.target.short(),
            tx.confirmation_count(),
            threshold
        );
    }

    Ok(())
}

/// Show registry contents
pub fn cmd_registry(state: &AppState) -> CliResult<()> {
    let registry = state.deployment.registry();

    println!("📋 Registry {}", registry.address());
    println!("   Owner: {}", registry.owner());
    println!("\n   Minters:");
    for minter in registry.minters() {
        println!("   └─ {}", minter);
    }
    println!("\n   Platforms:");
    for platform in registry.platforms() {
        println!("   └─ {}", platform);
    }

    Ok(())
}

/// Deploy an asset collection
pub fn cmd_collection_deploy(state: &mut AppState, from: &str, name: &str) -> CliResult<()> {
    let creator: Address = from.parse()?;
    let address = state.deployment.deploy_collection(creator, name)?;
    state.save()?;

    println!("🎨 Collection '{}' deployed!", name);
    println!("   Address: {}", address);
    println!("   Register it as a minter through the multisig before use.");

    Ok(())
}

/// Mint a token in a collection
pub fn cmd_collection_mint(
    state: &mut AppState,
    from: &str,
    collection: &str,
    to: &str,
    token_id: &str,
) -> CliResult<()> {
    let caller: Address = from.parse()?;
    let collection: Address = collection.parse()?;
    let to: Address = to.parse()?;
    let token_id: ResourceId = token_id.trim().parse()?;

    let event = state.deployment.mint(&collection, caller, to, token_id)?;
    state.save()?;

    println!("🪙 Token {} minted to {}", event.token_id, event.to);
    Ok(())
}

/// List collections
pub fn cmd_collection_list(state: &AppState) -> CliResult<()> {
    let collections = state.deployment.collections();
    if collections.count() == 0 {
        println!("🎨 No collections deployed yet.");
        return Ok(());
    }

    println!("🎨 Collections ({}):", collections.count());
    for c in collections.list() {
        println!("   {} '{}' | {} tokens", c.address, c.name, c.total_supply());
    }
    Ok(())
}

/// Show the nonce for a participant set
pub fn cmd_nonce(state: &AppState, participants: &str) -> CliResult<()> {
    let participants: Vec<Address> = parse_list(participants)?;
    let nonce = state.deployment.verifier().nonce_of(&participants);
    println!("🔢 Nonce: {}", nonce);
    Ok(())
}

/// Sign the current descriptor for an action as one participant
pub fn cmd_sign(
    state: &AppState,
    private_key: &str,
    ids: &str,
    authorizers: &str,
    participants: &str,
    commit: bool,
) -> CliResult<()> {
    let key = KeyPair::from_private_key_hex(private_key)?;
    let ids: Vec<ResourceId> = parse_list(ids)?;
    let authorizers: Vec<Address> = parse_list(authorizers)?;
    let participants: Vec<Address> = parse_list(participants)?;

    if !participants.contains(&key.address()) {
        println!("⚠️  {} is not one of the participants", key.address());
    }

    let descriptor = state.deployment.descriptor(&ids, &authorizers, &participants);
    let descriptor = if commit {
        descriptor.with_role(COMMIT)
    } else {
        descriptor
    };
    let signature = key.sign_digest(&descriptor.digest());

    println!("✍️  Signed {} at nonce {}", if commit { "commit" } else { "offer" }, descriptor.nonce);
    println!("   Digest: 0x{}", hex::encode(descriptor.digest()));
    println!("   Signature: {}", signature);

    Ok(())
}

/// Submit a co-signed action to the verifier
pub fn cmd_verify(
    state: &mut AppState,
    from: &str,
    signatures: &str,
    ids: &str,
    authorizers: &str,
    participants: &str,
) -> CliResult<()> {
    let submitter: Address = from.parse()?;
    let signatures: Vec<Signature> = parse_list(signatures)?;
    let ids: Vec<ResourceId> = parse_list(ids)?;
    let authorizers: Vec<Address> = parse_list(authorizers)?;
    let participants: Vec<Address> = parse_list(participants)?;

    let before = state.deployment.verifier().nonce_of(&participants);
    let outcome = state
        .deployment
        .verify(submitter, &signatures, &ids, &authorizers, &participants);

    // A failed finalize still consumes the nonce
    if state.deployment.verifier().nonce_of(&participants) != before {
        state.save()?;
    }

    let nonce = outcome?;
    println!("✅ Action verified at nonce {} and recorded", nonce);
    Ok(())
}

/// Print the merged event log
pub fn cmd_events(state: &AppState, since: u64, json: bool) -> CliResult<()> {
    let events = state.deployment.events();
    let events = events.since(since);

    if json {
        println!("{}", serde_json::to_string_pretty(events)?);
        return Ok(());
    }

    if events.is_empty() {
        println!("📭 No events.");
        return Ok(());
    }

    println!("📜 Events:");
    for event in events {
        let summary = match &event.kind {
            EventKind::Submitted { index, submitter, target, .. } => {
                format!("Submitted #{} by {} → {}", index, submitter.short(), target.short())
            }
            EventKind::Confirmed { index, signer } => {
                format!("Confirmed #{} by {}", index, signer.short())
            }
            EventKind::Executed { index, success, .. } => {
                format!("Executed #{} ({})", index, if *success { "ok" } else { "forward failed" })
            }
            EventKind::Verified { participants, nonce, .. } => {
                format!("Verified {} participants at nonce {}", participants.len(), nonce)
            }
            EventKind::Finalized { nonce, success, .. } => {
                format!("Finalized nonce {} ({})", nonce, if *success { "ok" } else { "failed" })
            }
        };
        println!(
            "   #{} | {} | {}",
            event.seq,
            event.timestamp.format("%Y-%m-%d %H:%M:%S"),
            summary
        );
    }

    Ok(())
}

/// Export the deployment to a file
pub fn cmd_export(state: &AppState, path: &Path) -> CliResult<()> {
    crate::storage::save_to_file(&state.deployment, path)?;
    println!("📦 Deployment exported to {:?}", path);
    Ok(())
}

/// Import a deployment from a file
pub fn cmd_import(state: &mut AppState, path: &Path) -> CliResult<()> {
    state.deployment = crate::storage::load_from_file(path)?;
    state.save()?;
    println!("📥 Deployment imported from {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::U256;
    use crate::crypto::AbiValue;
    use crate::deployment::DeploymentError;
    use crate::multisig::MultisigError;
    use crate::registry::ADD_MINTER;
    use crate::verifier::VerifyError;

    const WIDE_ID: &str = "340282366920938463463374607431768211456";

    struct World {
        dir: tempfile::TempDir,
        deployer: Address,
        signers: Vec<KeyPair>,
        players: Vec<KeyPair>,
        nft: Address,
    }

    impl World {
        fn load(&self) -> AppState {
            AppState::new(self.dir.path().to_path_buf()).unwrap()
        }

        fn player_addresses(&self) -> Vec<Address> {
            self.players.iter().map(|k| k.address()).collect()
        }
    }

    /// 2-of-3 committee, a registered collection and tokens 1 and 2 minted
    /// to the two players, saved to a fresh data directory
    fn world() -> World {
        let dir = tempfile::tempdir().unwrap();
        let signers: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
        let players: Vec<KeyPair> = (0..2).map(|_| KeyPair::generate()).collect();
        let deployer = KeyPair::generate().address();

        let config = DeploymentConfig::new(deployer, signers.iter().map(|k| k.address()).collect(), 2);
        let mut deployment = Deployment::new(config).unwrap();
        let nft = deployment.deploy_collection(deployer, "Arena").unwrap();
        let index = deployment
            .submit_registry_call(signers[0].address(), ADD_MINTER, &[AbiValue::Address(nft)])
            .unwrap();
        for signer in &signers[..2] {
            deployment.confirm(signer.address(), index).unwrap();
        }
        deployment.execute(signers[0].address(), index).unwrap();
        deployment.mint(&nft, deployer, players[0].address(), U256::from(1)).unwrap();
        deployment.mint(&nft, deployer, players[1].address(), U256::from(2)).unwrap();

        Storage::new(StorageConfig {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        })
        .unwrap()
        .save(&deployment)
        .unwrap();

        World {
            dir,
            deployer,
            signers,
            players,
            nft,
        }
    }

    fn join<T: ToString>(items: &[T]) -> String {
        items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(",")
    }

    #[test]
    fn test_parse_list_takes_full_width_ids() {
        let ids: Vec<ResourceId> = parse_list(&format!("1, 0x10, {}", WIDE_ID)).unwrap();
        assert_eq!(ids, vec![U256::from(1), U256::from(16), U256::from(1) << 128usize]);

        assert!(parse_list::<ResourceId>(&format!("0x1{}", "0".repeat(64))).is_err());
        assert!(parse_list::<ResourceId>("12abc").is_err());
    }

    #[test]
    fn test_failed_execute_is_saved_once() {
        let w = world();
        let mut state = w.load();
        let from = w.signers[0].address().to_string();

        // Nothing is deployed at the deployer address
        cmd_multisig_submit(
            &mut state,
            &from,
            Some(&w.deployer.to_string()),
            None,
            &[],
            Some("0x01020304"),
            0,
        )
        .unwrap();
        for signer in &w.signers[1..] {
            cmd_multisig_confirm(&mut state, &signer.address().to_string(), 1).unwrap();
        }

        let err = cmd_multisig_execute(&mut state, &from, 1).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DeploymentError>(),
            Some(DeploymentError::Multisig(MultisigError::DownstreamFailure(_)))
        ));

        let mut state = w.load();
        let tx = state.deployment.transaction(1).unwrap();
        assert!(tx.is_executed());
        assert!(tx.execution_error.is_some());

        let err = cmd_multisig_execute(&mut state, &from, 1).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DeploymentError>(),
            Some(DeploymentError::Multisig(MultisigError::AlreadyExecuted(1)))
        ));
        // The rejected retry wrote no snapshot, so the newest backup predates execution
        let previous = state.storage.restore_backup(0).unwrap();
        assert!(!previous.transaction(1).unwrap().is_executed());
    }

    #[test]
    fn test_failed_finalize_keeps_consumed_nonce() {
        let w = world();
        let mut state = w.load();
        let players = w.player_addresses();
        let minters = [w.nft, w.nft];

        // Token 2 belongs to the second player, so the ledger rejects this pairing
        let ids = vec![U256::from(2), U256::from(1)];
        let signatures = state.deployment.descriptor(&ids, &minters, &players).cosign(&w.players);

        let err = cmd_verify(
            &mut state,
            &players[0].to_string(),
            &join(&signatures),
            "2,1",
            &join(&minters),
            &join(&players),
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DeploymentError>(),
            Some(DeploymentError::Verify(VerifyError::DownstreamFailure(_)))
        ));

        let state = w.load();
        assert_eq!(state.deployment.get_nonce(players[1], players[0]), 1);
        assert!(state.deployment.ledger().matches().is_empty());
    }

    #[test]
    fn test_rejected_signatures_leave_snapshot_untouched() {
        let w = world();
        let mut state = w.load();
        let players = w.player_addresses();
        let minters = [w.nft, w.nft];
        let backups = state.storage.list_backups();

        let ids = vec![U256::from(1), U256::from(2)];
        let mut signatures = state.deployment.descriptor(&ids, &minters, &players).cosign(&w.players);
        signatures.swap(0, 1);

        assert!(cmd_verify(
            &mut state,
            &players[0].to_string(),
            &join(&signatures),
            "1,2",
            &join(&minters),
            &join(&players),
        )
        .is_err());
        assert_eq!(state.storage.list_backups(), backups);
        assert_eq!(w.load().deployment.get_nonce(players[0], players[1]), 0);
    }

    #[test]
    fn test_wide_token_id_mint_and_verify() {
        let w = world();
        let mut state = w.load();
        let players = w.player_addresses();
        let minters = [w.nft, w.nft];

        cmd_collection_mint(
            &mut state,
            &w.deployer.to_string(),
            &w.nft.to_string(),
            &players[0].to_string(),
            "0x100000000000000000000000000000000",
        )
        .unwrap();

        let wide = U256::from(1) << 128usize;
        let ids = vec![wide, U256::from(2)];
        let signatures = state.deployment.descriptor(&ids, &minters, &players).cosign(&w.players);
        cmd_verify(
            &mut state,
            &players[1].to_string(),
            &join(&signatures),
            &format!("{},2", WIDE_ID),
            &join(&minters),
            &join(&players),
        )
        .unwrap();

        let state = w.load();
        assert_eq!(state.deployment.collections().owner_of(&w.nft, wide), Some(players[0]));
        assert_eq!(state.deployment.ledger().matches()[0].resource_ids, ids);
    }
}

use maci_crypto::acc_queue::AccQueue;
use maci_crypto::tree::{calc_root, gen_tree_commitment, verify_merkle_path, Arity, IncrementalQuinTree, NOTHING_UP_MY_SLEEVE};
use maci_crypto::Fr;
use maci_domainobjs::ballot::{empty_ballot_roots, Ballot};
use maci_domainobjs::commands::{Message, VoteCommand};
use maci_domainobjs::config::TreeDepths;
use maci_domainobjs::keys::{Keypair, PublicKey};
use maci_domainobjs::processing::{decrypt_messages, MessageStatus};
use maci_domainobjs::state_leaf::StateLeaf;
use rand::thread_rng;

const VOICE_CREDITS: u64 = 100;

#[test]
fn test_poll_round() {
    let mut rng = thread_rng();
    let depths = TreeDepths {
        state_tree_depth: 2,
        vote_option_tree_depth: 1,
        message_tree_depth: 2,
    };
    depths.validate().unwrap();
    let num_vote_options = depths.max_vote_options().unwrap();

    let coordinator = Keypair::random(&mut rng);
    let voters: Vec<Keypair> = (0..3).map(|_| Keypair::random(&mut rng)).collect();

    // sign up: index 0 holds the blank leaf
    let mut state_tree =
        IncrementalQuinTree::new(depths.state_tree_depth, Fr::from(0u64), Arity::Quinary).unwrap();
    let mut state_leaves = vec![StateLeaf::gen_blank_leaf()];
    state_tree.insert(state_leaves[0].hash().unwrap()).unwrap();
    for voter in voters.iter() {
        let leaf = StateLeaf::new(voter.pub_key, Fr::from(VOICE_CREDITS));
        state_tree.insert(leaf.hash().unwrap()).unwrap();
        state_leaves.push(leaf);
    }

    // publish: each voter votes for option `i` with weight `i + 1`, the last
    // message is encrypted for a different coordinator
    let mut message_tree =
        IncrementalQuinTree::new(depths.message_tree_depth, NOTHING_UP_MY_SLEEVE, Arity::Quinary).unwrap();
    let mut message_queue = AccQueue::new(1, Arity::Quinary, NOTHING_UP_MY_SLEEVE).unwrap();
    let mut batch: Vec<(Message, PublicKey)> = Vec::new();
    for (i, voter) in voters.iter().enumerate() {
        let ephemeral = Keypair::random(&mut rng);
        let recipient = if i == 2 { Keypair::random(&mut rng) } else { coordinator.clone() };
        let command = VoteCommand::with_random_salt(
            &mut rng,
            i as u64 + 1,
            voter.pub_key,
            i as u64,
            i as u64 + 1,
            1,
            0,
        )
        .unwrap();
        let signature = command.sign(&voter.priv_key).unwrap();
        let shared = Keypair::gen_ecdh_shared_key(&ephemeral.priv_key, &recipient.pub_key).unwrap();
        let message = command.encrypt(&signature, &shared).unwrap();

        let json = message.to_json().unwrap();
        let message = Message::from_json(&json).unwrap();
        message_tree.insert(message.hash(&ephemeral.pub_key).unwrap()).unwrap();
        message_queue.enqueue(message.hash(&ephemeral.pub_key).unwrap()).unwrap();
        batch.push((message, ephemeral.pub_key));
    }
    let expected_message_root = calc_root(
        depths.message_tree_depth,
        NOTHING_UP_MY_SLEEVE,
        Arity::Quinary,
        &batch.iter().map(|(m, k)| m.hash(k).unwrap()).collect::<Vec<_>>(),
    )
    .unwrap();
    assert_eq!(message_tree.root(), expected_message_root);
    assert!(message_queue.merge_sub_roots(0).unwrap());
    assert_eq!(message_queue.merge(depths.message_tree_depth).unwrap(), expected_message_root);

    // process
    let blank_ballot = Ballot::new(num_vote_options, depths.vote_option_tree_depth).unwrap();
    let blank_root = IncrementalQuinTree::new(depths.state_tree_depth, blank_ballot.hash().unwrap(), Arity::Quinary)
        .unwrap()
        .root();
    assert_eq!(blank_root, empty_ballot_roots(depths.state_tree_depth).unwrap()[0]);

    let mut ballots = vec![blank_ballot.clone(); state_leaves.len()];
    let results = decrypt_messages(&coordinator.priv_key, &batch);
    let mut applied = 0;
    for result in results {
        let decrypted = result.unwrap();
        let index = decrypted.command.state_index as usize;
        let Some(leaf) = state_leaves.get(index) else {
            continue;
        };
        if !decrypted.is_valid_for(&leaf.pub_key) {
            assert_eq!(decrypted.status, MessageStatus::Tampered);
            continue;
        }

        let ballot = &mut ballots[index];
        ballot.votes[decrypted.command.vote_option_index as usize] =
            Fr::from(decrypted.command.new_vote_weight);
        ballot.nonce = Fr::from(decrypted.command.nonce);

        let weight = Fr::from(decrypted.command.new_vote_weight);
        let updated = StateLeaf::new(decrypted.command.new_pub_key, leaf.voice_credit_balance - weight * weight);
        state_tree.update(index, updated.hash().unwrap()).unwrap();
        state_leaves[index] = updated;
        applied += 1;
    }
    assert_eq!(applied, 2);
    assert_eq!(state_leaves[1].voice_credit_balance, Fr::from(VOICE_CREDITS - 1));
    assert_eq!(state_leaves[2].voice_credit_balance, Fr::from(VOICE_CREDITS - 4));
    assert_eq!(state_leaves[3].voice_credit_balance, Fr::from(VOICE_CREDITS));

    let leaf_hashes: Vec<Fr> = state_leaves.iter().map(|l| l.hash().unwrap()).collect();
    assert_eq!(
        state_tree.root(),
        calc_root(depths.state_tree_depth, Fr::from(0u64), Arity::Quinary, &leaf_hashes).unwrap()
    );

    let path = state_tree.gen_merkle_path(2).unwrap();
    assert!(verify_merkle_path(
        &leaf_hashes[2],
        &path,
        |c| Arity::Quinary.hash(c),
        depths.state_tree_depth,
        &state_tree.root()
    ));

    let ballot_hashes: Vec<Fr> = ballots.iter().map(|b| b.hash().unwrap()).collect();
    let ballot_root = calc_root(
        depths.state_tree_depth,
        blank_ballot.hash().unwrap(),
        Arity::Quinary,
        &ballot_hashes,
    )
    .unwrap();
    assert_ne!(ballot_root, blank_root);

    // tally commitment over the per option totals
    let mut totals = vec![Fr::from(0u64); num_vote_options];
    for ballot in ballots.iter() {
        for (total, vote) in totals.iter_mut().zip(ballot.votes.iter()) {
            *total += vote;
        }
    }
    assert_eq!(totals[0], Fr::from(1u64));
    assert_eq!(totals[1], Fr::from(2u64));
    let salt = Fr::from(7u64);
    let commitment = gen_tree_commitment(&totals, &salt, depths.vote_option_tree_depth).unwrap();
    assert_ne!(commitment, gen_tree_commitment(&totals, &Fr::from(8u64), depths.vote_option_tree_depth).unwrap());
}

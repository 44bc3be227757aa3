//! End-to-end scenarios run through the public `execute_bytecode` entry
//! point, exercising opcodes the same way a real caller would: raw bytecode
//! in, output/logs/state effects out.

use fevm::db::memory_store::InMemoryDatabase;
use fevm::execution_context::ExecutionContext;
use fevm::oracle::NullOracle;
use fevm::types::{Account, Address, Word};

fn run(code: &[u8], sender: Address, db: &mut InMemoryDatabase) -> fevm::computation::Computation {
    let oracle = NullOracle;
    fevm::execute_bytecode(
        sender,
        Word::zero(),
        10_000_000,
        Some(Address::repeat_byte(0xaa)),
        sender,
        Word::zero(),
        bytes::Bytes::new(),
        bytes::Bytes::copy_from_slice(code),
        None,
        db,
        &oracle,
        ExecutionContext::genesis(1),
    )
}

fn push1(n: u8) -> Vec<u8> {
    vec![0x60, n]
}

fn address_word(address: Address) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[12..].copy_from_slice(address.as_bytes());
    out
}

fn push32(bytes: [u8; 32]) -> Vec<u8> {
    let mut out = vec![0x7f];
    out.extend_from_slice(&bytes);
    out
}

fn push20(address: Address) -> Vec<u8> {
    let mut out = vec![0x73];
    out.extend_from_slice(address.as_bytes());
    out
}

/// A PUSH32 of a word with `bytes` right-aligned and zero-padded on the
/// left, so the pushed word's low-order bytes are `bytes` verbatim.
fn push32_right_aligned(bytes: &[u8]) -> Vec<u8> {
    let mut word = [0u8; 32];
    let start = 32 - bytes.len();
    word[start..].copy_from_slice(bytes);
    push32(word)
}

#[test]
fn add_of_one_and_one_yields_two() {
    let mut db = InMemoryDatabase::new();
    let mut code = push1(1);
    code.extend(push1(1));
    code.push(0x01); // ADD
    code.extend([0x60, 0x00, 0x52]); // PUSH1 0, MSTORE
    code.extend([0x60, 0x20, 0x60, 0x00, 0xf3]); // PUSH1 32, PUSH1 0, RETURN

    let computation = run(&code, Address::zero(), &mut db);
    assert!(computation.is_success());
    assert_eq!(Word::from_big_endian(&computation.output), Word::from(2));
}

#[test]
fn sdiv_of_negative_two_by_negative_one_yields_two() {
    let mut db = InMemoryDatabase::new();
    let minus_one = [0xffu8; 32];
    let mut minus_two = [0xffu8; 32];
    minus_two[31] = 0xfe;

    let mut code = push32(minus_one);
    code.extend(push32(minus_two));
    code.push(0x05); // SDIV
    code.extend([0x60, 0x00, 0x52]);
    code.extend([0x60, 0x20, 0x60, 0x00, 0xf3]);

    let computation = run(&code, Address::zero(), &mut db);
    assert!(computation.is_success());
    assert_eq!(Word::from_big_endian(&computation.output), Word::from(2));
}

#[test]
fn shr_of_0xff_by_4_yields_0x0f() {
    let mut db = InMemoryDatabase::new();
    let mut code = push1(0xff);
    code.extend(push1(0x04));
    code.push(0x1c); // SHR
    code.extend([0x60, 0x00, 0x52]);
    code.extend([0x60, 0x20, 0x60, 0x00, 0xf3]);

    let computation = run(&code, Address::zero(), &mut db);
    assert!(computation.is_success());
    assert_eq!(Word::from_big_endian(&computation.output), Word::from(0x0f));
}

#[test]
fn extcodehash_of_account_with_code_is_keccak_of_that_code() {
    let mut db = InMemoryDatabase::new();
    let oracle = NullOracle;
    let mut state = fevm::state::State::new(&mut db, &oracle, ExecutionContext::genesis(1));
    let target = Address::repeat_byte(0x33);
    state.set_code(target, bytes::Bytes::from_static(b"pseudocode")).unwrap();
    drop(state);

    let mut code = push32(address_word(target));
    code.push(0x3f); // EXTCODEHASH
    code.extend([0x60, 0x00, 0x52]);
    code.extend([0x60, 0x20, 0x60, 0x00, 0xf3]);

    let computation = run(&code, Address::zero(), &mut db);
    assert!(computation.is_success());
    let expected = fevm::types::keccak(b"pseudocode");
    assert_eq!(computation.output.as_ref(), expected.as_bytes());
}

#[test]
fn extcodehash_of_balance_only_account_matches_empty_code_hash() {
    let mut db = InMemoryDatabase::new();
    let oracle = NullOracle;
    let mut state = fevm::state::State::new(&mut db, &oracle, ExecutionContext::genesis(1));
    let target = Address::repeat_byte(0x44);
    state.set_account(target, Account { balance: Word::from(5), ..Account::empty() });
    drop(state);

    let mut code = push32(address_word(target));
    code.push(0x3f);
    code.extend([0x60, 0x00, 0x52]);
    code.extend([0x60, 0x20, 0x60, 0x00, 0xf3]);

    let computation = run(&code, Address::zero(), &mut db);
    assert!(computation.is_success());
    assert_eq!(computation.output.as_ref(), fevm::types::EMPTY_HASH.as_bytes());
}

#[test]
fn extcodehash_of_nonexistent_account_is_zero() {
    let mut db = InMemoryDatabase::new();
    let target = Address::repeat_byte(0x55);

    let mut code = push32(address_word(target));
    code.push(0x3f);
    code.extend([0x60, 0x00, 0x52]);
    code.extend([0x60, 0x20, 0x60, 0x00, 0xf3]);

    let computation = run(&code, Address::zero(), &mut db);
    assert!(computation.is_success());
    assert_eq!(Word::from_big_endian(&computation.output), Word::zero());
}

#[test]
fn create_from_a_funded_empty_account_derives_the_documented_address() {
    let mut db = InMemoryDatabase::new();
    let oracle = NullOracle;
    let sender = Address::from_slice(&hex::decode("9bbfed6889322e016e0a02ee459d306fc19545d8").unwrap());
    {
        let mut state = fevm::state::State::new(&mut db, &oracle, ExecutionContext::genesis(1));
        state.set_balance(sender, Word::from(10)).unwrap();
    }

    // CREATE(value=0, offset=0, length=0), store the result, RETURN it.
    let mut code = push1(0); // length
    code.extend(push1(0)); // offset
    code.extend(push1(0)); // value
    code.push(0xf0); // CREATE
    code.extend([0x60, 0x00, 0x52]);
    code.extend([0x60, 0x20, 0x60, 0x00, 0xf3]);

    let computation = run(&code, sender, &mut db);
    assert!(computation.is_success());
    let expected = Address::from_slice(&hex::decode("43a61f3f4c73ea0d444c5c1c1a8544067a86219b").unwrap());
    assert_eq!(Word::from_big_endian(&computation.output), Word::from_big_endian(expected.as_bytes()));

    let oracle = NullOracle;
    let mut state = fevm::state::State::new(&mut db, &oracle, ExecutionContext::genesis(1));
    assert_eq!(state.get_nonce(sender).unwrap(), 1);
}

#[test]
fn create2_with_a_zero_salt_derives_the_documented_address() {
    let mut db = InMemoryDatabase::new();
    let oracle = NullOracle;
    let sender = Address::from_slice(&hex::decode("9bbfed6889322e016e0a02ee459d306fc19545d8").unwrap());
    {
        let mut state = fevm::state::State::new(&mut db, &oracle, ExecutionContext::genesis(1));
        state.set_balance(sender, Word::from(10)).unwrap();
    }

    // CREATE2(value=0, offset=0, length=0, salt=0), store the result, RETURN it.
    let mut code = push1(0); // salt
    code.extend(push1(0)); // length
    code.extend(push1(0)); // offset
    code.extend(push1(0)); // value
    code.push(0xf5); // CREATE2
    code.extend([0x60, 0x00, 0x52]);
    code.extend([0x60, 0x20, 0x60, 0x00, 0xf3]);

    let computation = run(&code, sender, &mut db);
    assert!(computation.is_success());
    let expected = Address::from_slice(&hex::decode("0687a12da0ffa0a64a28c9512512b8ae8870b7ea").unwrap());
    assert_eq!(Word::from_big_endian(&computation.output), Word::from_big_endian(expected.as_bytes()));
}

#[test]
fn selfdestruct_from_a_contract_created_this_transaction_transfers_its_balance() {
    let mut db = InMemoryDatabase::new();
    let beneficiary = Address::repeat_byte(0x66);
    let sender = Address::repeat_byte(0x07);
    // `run` always targets Address::repeat_byte(0xaa) as the executing
    // contract, so CREATE's creator (and the value-transfer source) is
    // that address, not `sender` (the EOA origin).
    let creator = Address::repeat_byte(0xaa);
    let oracle = NullOracle;
    {
        let mut state = fevm::state::State::new(&mut db, &oracle, ExecutionContext::genesis(1));
        state.set_balance(creator, Word::from(1_000)).unwrap();
    }

    // Init code that just SELFDESTRUCTs to `beneficiary`: PUSH20 <address>,
    // SELFDESTRUCT -- 22 bytes, short enough to fit in one memory word.
    let mut init_code = push20(beneficiary);
    init_code.push(0xff); // SELFDESTRUCT
    let init_code_len = u8::try_from(init_code.len()).unwrap();

    // Outer contract: lay the init code out in memory via PUSH32+MSTORE,
    // then CREATE a contract funded with value=100 and run it, exercising
    // the real CREATE opcode rather than bypassing the dispatch loop.
    let mut code = push32_right_aligned(&init_code);
    code.extend([0x60, 0x00, 0x52]); // PUSH1 0, MSTORE
    code.extend(push1(init_code_len)); // length
    code.extend(push1(32 - init_code_len)); // offset: right-aligned in the word
    code.extend(push1(100)); // value
    code.push(0xf0); // CREATE
    code.extend([0x60, 0x00, 0x52]); // PUSH1 0, MSTORE the returned address
    code.extend([0x60, 0x20, 0x60, 0x00, 0xf3]); // RETURN the word at mem[0..32]

    let computation = run(&code, sender, &mut db);
    assert!(computation.is_success());
    let contract = Address::from_slice(&computation.output[12..]);
    assert_eq!(computation.get_self_destruct_beneficiaries(), vec![beneficiary]);
    assert_eq!(computation.get_accounts_for_deletion(), vec![contract]);

    let oracle = NullOracle;
    let mut state = fevm::state::State::new(&mut db, &oracle, ExecutionContext::genesis(1));
    assert_eq!(state.get_balance(contract).unwrap(), Word::zero());
    assert_eq!(state.get_balance(beneficiary).unwrap(), Word::from(100));
}

#[test]
fn three_log0_emissions_in_a_loop_are_recorded_in_order() {
    let mut db = InMemoryDatabase::new();

    // mem[0..32] = "hello" right-padded... spec wants right-aligned in 32
    // bytes, so store "hello" at offset 27 (32 - 5).
    let mut code = Vec::new();
    // store the 5-byte "hello" right-aligned in the first word of memory.
    let mut word = [0u8; 32];
    word[27..].copy_from_slice(b"hello");
    code.extend(push32(word));
    code.extend(push1(0));
    code.push(0x52); // MSTORE mem[0] = word

    // counter = 3 at mem[32]
    code.extend(push1(3));
    code.extend(push1(32));
    code.push(0x52); // MSTORE mem[32] = 3

    // loop: JUMPDEST
    let loop_pc = code.len();
    code.push(0x5b); // JUMPDEST

    code.extend(push1(32));
    code.push(0x51); // MLOAD mem[32] -> counter
    code.extend(push1(0));
    code.push(0x14); // EQ counter == 0
    let jumpi_placeholder = code.len();
    code.extend(push1(0)); // placeholder destination, patched below
    code.push(0x57); // JUMPI exit if counter == 0

    code.extend(push1(32));
    code.extend(push1(0)); // LOG0(offset=0, size=32)
    code.push(0xa0); // LOG0

    code.extend(push1(32));
    code.push(0x51); // MLOAD counter
    code.extend(push1(1));
    code.push(0x03); // SUB counter - 1
    code.extend(push1(32));
    code.push(0x52); // MSTORE counter

    let jump_back_dest = u8::try_from(loop_pc).unwrap();
    code.extend(push1(jump_back_dest));
    code.push(0x56); // JUMP back to loop

    let exit_pc = u8::try_from(code.len()).unwrap();
    code.push(0x00); // STOP
    code[jumpi_placeholder + 1] = exit_pc;

    let computation = run(&code, Address::zero(), &mut db);
    assert!(computation.is_success(), "error: {:?}", computation.error);
    let logs = computation.get_raw_log_entries();
    assert_eq!(logs.len(), 3);
    for (i, log) in logs.iter().enumerate() {
        assert_eq!(log.sequence_number, u64::try_from(i).unwrap());
        let mut expected = [0u8; 32];
        expected[27..].copy_from_slice(b"hello");
        assert_eq!(log.data.as_ref(), &expected);
    }
}

#[test]
fn jump_into_push_immediate_data_fails() {
    let mut db = InMemoryDatabase::new();
    // PUSH1 0x5b (push a byte that happens to look like JUMPDEST), then JUMP
    // to the data byte's own offset.
    let code = vec![0x60, 0x5b, 0x60, 0x01, 0x56]; // PUSH1 0x5b; PUSH1 1; JUMP
    let computation = run(&code, Address::zero(), &mut db);
    assert!(computation.is_error());
}

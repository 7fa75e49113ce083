//! Fixed vectors for the organization contract's typed data.
//!
//! Digests were produced independently of this crate (plain keccak-256 over the
//! ABI encoding) and the signature with RFC 6979 deterministic nonces, so a
//! change in any hash or in the signing path shows up here.

use alloy::primitives::{address, b256, Address, U256};
use diagonal::constants::{CHARGE_BATCH_TYPE, CHARGE_TYPE, USDC_GOERLI, WITHDRAWAL_TYPE};
use diagonal::eip712::{charge_batch_type_hash, charge_id_hash};
use diagonal::signer::{
    recover_signer, BatchEntry, ChargeBatchRequest, ChargeRequest, WithdrawalRequest,
};
use diagonal::{ChargeSigner, OrgContract, TokenRegistry};

const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const SIGNER: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");
const ORG: Address = address!("1111111111111111111111111111111111111111");
const SOURCE: Address = address!("abcdefabcdefabcdefabcdefabcdefabcdefabcd");

fn signer() -> ChargeSigner {
    ChargeSigner::from_private_key(KEY, TokenRegistry::default()).unwrap()
}

fn goerli_org() -> OrgContract {
    OrgContract::new(ORG, 5)
}

fn charge() -> ChargeRequest {
    ChargeRequest {
        id: "chg_123".to_string(),
        source: SOURCE,
        token: USDC_GOERLI,
        amount: "10".to_string(),
    }
}

#[test]
fn type_hashes() {
    assert_eq!(
        alloy::primitives::keccak256(CHARGE_TYPE),
        b256!("918d170e61d8c25972b0b37320dea52389627603aa7e4ef0e266c9d149311250")
    );
    assert_eq!(
        alloy::primitives::keccak256(WITHDRAWAL_TYPE),
        b256!("10ccffdffc15064d8cfd450345ec4b9c4748ebbfc3229b1226791643c2bb7e67")
    );
    assert_eq!(
        charge_batch_type_hash(),
        alloy::primitives::keccak256(CHARGE_BATCH_TYPE)
    );
    assert_eq!(
        charge_batch_type_hash(),
        b256!("7be1b1ea8a69b89b484ec5de49775a85be1231e28a7b40559e1442dfc7e33169")
    );
}

#[test]
fn charge_id_is_keccak_of_string() {
    assert_eq!(
        charge_id_hash("chg_123"),
        b256!("fd40f47c4228dafbdec7a69f248c29928e2d83cb93b1886b59345e7b3d9ba592")
    );
}

#[test]
fn domain_separators() {
    assert_eq!(
        goerli_org().domain_separator(),
        b256!("f7e5418f1a11d414734f7268b2734a257a83ad8a633bd277206f5f826fa8208f")
    );
    assert_eq!(
        OrgContract::new(ORG, 1).domain_separator(),
        b256!("82e107d11a4b1ef5287a19d379dc3a5266100f3a6250df9f623b4f77debcc38e")
    );
}

#[test]
fn charge_struct_hash_and_digest() {
    let signer = signer();
    let typed = signer
        .charge_struct(&charge(), &goerli_org(), U256::from(3u64))
        .unwrap();
    assert_eq!(typed.amount, U256::from(10_000_000u64));
    assert_eq!(
        diagonal::eip712::charge_struct_hash(&typed),
        b256!("249b71b20ca996e9083df62227a0efce56fb506f4035db8383d8293b4810704c")
    );

    let signed = signer
        .sign_charge(&charge(), &goerli_org(), U256::from(3u64))
        .unwrap();
    assert_eq!(
        signed.digest,
        b256!("cb75360cec335c55d969330fa27198584adfa240b762c880e48f6b4f7f6222ba")
    );
}

#[test]
fn charge_signature_is_deterministic() {
    let signed = signer()
        .sign_charge(&charge(), &goerli_org(), U256::from(3u64))
        .unwrap();
    assert_eq!(signed.signature.v, 28);
    assert_eq!(
        signed.signature.r,
        b256!("eb51df504891785ca184ab52b15f171289a20f6ca3c775f2914ad68ece8944ab")
    );
    assert_eq!(
        signed.signature.s,
        b256!("1344db51a9fcd197bb792d38497daa6558a7c3cdb33d84ca7bcc4fd1d734e583")
    );
    assert_eq!(recover_signer(&signed.digest, &signed.signature).unwrap(), SIGNER);
}

#[test]
fn withdrawal_digest() {
    let signed = signer()
        .sign_withdrawal(
            &WithdrawalRequest {
                id: "wd_456".to_string(),
                token: USDC_GOERLI,
                amount: "5".to_string(),
                fee: "0.25".to_string(),
            },
            &goerli_org(),
            U256::from(7u64),
        )
        .unwrap();
    assert_eq!(
        signed.digest,
        b256!("4362325ea54b70789caff03408357df390422e38707c4734b6733b041df6724a")
    );
    assert_eq!(recover_signer(&signed.digest, &signed.signature).unwrap(), SIGNER);
}

#[test]
fn batch_digest() {
    let request = ChargeBatchRequest {
        id: "batch_789".to_string(),
        entries: vec![
            BatchEntry {
                source: SOURCE,
                token: USDC_GOERLI,
                amount: "10".to_string(),
            },
            BatchEntry {
                source: address!("2222222222222222222222222222222222222222"),
                token: USDC_GOERLI,
                amount: "2.5".to_string(),
            },
        ],
    };
    let signed = signer()
        .sign_charge_batch(&request, &goerli_org(), U256::from(11u64))
        .unwrap();
    assert_eq!(
        signed.digest,
        b256!("95f699d618efbb4e2892abdd844f5c22b53bf238034984d1ed50eacf50603e9f")
    );
    assert_eq!(recover_signer(&signed.digest, &signed.signature).unwrap(), SIGNER);
}

#[test]
fn signature_json_shape() {
    let signed = signer()
        .sign_charge(&charge(), &goerli_org(), U256::from(3u64))
        .unwrap();
    let json = serde_json::to_value(signed.signature).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "v": 28,
            "r": "0xeb51df504891785ca184ab52b15f171289a20f6ca3c775f2914ad68ece8944ab",
            "s": "0x1344db51a9fcd197bb792d38497daa6558a7c3cdb33d84ca7bcc4fd1d734e583",
        })
    );
}

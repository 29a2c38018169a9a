//! Legacy cipher backend: Rijndael with a 256-bit block, CBC mode, zero padding
//!
//! Produces the same ciphertext as the retired mcrypt `rijndael-256` cipher,
//! which is not the AES-256 that modern libraries implement (AES fixes the
//! block at 128 bits). Key and IV are both fitted to 32 bytes.

use crate::derivation::fit;
use crate::error::{CryptoError, Result};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The single cipher name exposed by the legacy backend.
pub const LEGACY_CIPHER: &str = "rijndael-256-cbc";

/// Block size in bytes (Nb = 8 words).
pub const BLOCK_LEN: usize = 32;

/// Key size in bytes (Nk = 8 words).
pub const KEY_LEN: usize = 32;

const NB: usize = 8;
const NK: usize = 8;
const NR: usize = 14;

// Row offsets for ShiftRows with an 8-column state.
const SHIFTS: [usize; 4] = [0, 1, 3, 4];

const SBOX: [u8; 256] = [
    0x63, 0x7c, 0x77, 0x7b, 0xf2, 0x6b, 0x6f, 0xc5, 0x30, 0x01, 0x67, 0x2b, 0xfe, 0xd7, 0xab, 0x76,
    0xca, 0x82, 0xc9, 0x7d, 0xfa, 0x59, 0x47, 0xf0, 0xad, 0xd4, 0xa2, 0xaf, 0x9c, 0xa4, 0x72, 0xc0,
    0xb7, 0xfd, 0x93, 0x26, 0x36, 0x3f, 0xf7, 0xcc, 0x34, 0xa5, 0xe5, 0xf1, 0x71, 0xd8, 0x31, 0x15,
    0x04, 0xc7, 0x23, 0xc3, 0x18, 0x96, 0x05, 0x9a, 0x07, 0x12, 0x80, 0xe2, 0xeb, 0x27, 0xb2, 0x75,
    0x09, 0x83, 0x2c, 0x1a, 0x1b, 0x6e, 0x5a, 0xa0, 0x52, 0x3b, 0xd6, 0xb3, 0x29, 0xe3, 0x2f, 0x84,
    0x53, 0xd1, 0x00, 0xed, 0x20, 0xfc, 0xb1, 0x5b, 0x6a, 0xcb, 0xbe, 0x39, 0x4a, 0x4c, 0x58, 0xcf,
    0xd0, 0xef, 0xaa, 0xfb, 0x43, 0x4d, 0x33, 0x85, 0x45, 0xf9, 0x02, 0x7f, 0x50, 0x3c, 0x9f, 0xa8,
    0x51, 0xa3, 0x40, 0x8f, 0x92, 0x9d, 0x38, 0xf5, 0xbc, 0xb6, 0xda, 0x21, 0x10, 0xff, 0xf3, 0xd2,
    0xcd, 0x0c, 0x13, 0xec, 0x5f, 0x97, 0x44, 0x17, 0xc4, 0xa7, 0x7e, 0x3d, 0x64, 0x5d, 0x19, 0x73,
    0x60, 0x81, 0x4f, 0xdc, 0x22, 0x2a, 0x90, 0x88, 0x46, 0xee, 0xb8, 0x14, 0xde, 0x5e, 0x0b, 0xdb,
    0xe0, 0x32, 0x3a, 0x0a, 0x49, 0x06, 0x24, 0x5c, 0xc2, 0xd3, 0xac, 0x62, 0x91, 0x95, 0xe4, 0x79,
    0xe7, 0xc8, 0x37, 0x6d, 0x8d, 0xd5, 0x4e, 0xa9, 0x6c, 0x56, 0xf4, 0xea, 0x65, 0x7a, 0xae, 0x08,
    0xba, 0x78, 0x25, 0x2e, 0x1c, 0xa6, 0xb4, 0xc6, 0xe8, 0xdd, 0x74, 0x1f, 0x4b, 0xbd, 0x8b, 0x8a,
    0x70, 0x3e, 0xb5, 0x66, 0x48, 0x03, 0xf6, 0x0e, 0x61, 0x35, 0x57, 0xb9, 0x86, 0xc1, 0x1d, 0x9e,
    0xe1, 0xf8, 0x98, 0x11, 0x69, 0xd9, 0x8e, 0x94, 0x9b, 0x1e, 0x87, 0xe9, 0xce, 0x55, 0x28, 0xdf,
    0x8c, 0xa1, 0x89, 0x0d, 0xbf, 0xe6, 0x42, 0x68, 0x41, 0x99, 0x2d, 0x0f, 0xb0, 0x54, 0xbb, 0x16,
];

const INV_SBOX: [u8; 256] = [
    0x52, 0x09, 0x6a, 0xd5, 0x30, 0x36, 0xa5, 0x38, 0xbf, 0x40, 0xa3, 0x9e, 0x81, 0xf3, 0xd7, 0xfb,
    0x7c, 0xe3, 0x39, 0x82, 0x9b, 0x2f, 0xff, 0x87, 0x34, 0x8e, 0x43, 0x44, 0xc4, 0xde, 0xe9, 0xcb,
    0x54, 0x7b, 0x94, 0x32, 0xa6, 0xc2, 0x23, 0x3d, 0xee, 0x4c, 0x95, 0x0b, 0x42, 0xfa, 0xc3, 0x4e,
    0x08, 0x2e, 0xa1, 0x66, 0x28, 0xd9, 0x24, 0xb2, 0x76, 0x5b, 0xa2, 0x49, 0x6d, 0x8b, 0xd1, 0x25,
    0x72, 0xf8, 0xf6, 0x64, 0x86, 0x68, 0x98, 0x16, 0xd4, 0xa4, 0x5c, 0xcc, 0x5d, 0x65, 0xb6, 0x92,
    0x6c, 0x70, 0x48, 0x50, 0xfd, 0xed, 0xb9, 0xda, 0x5e, 0x15, 0x46, 0x57, 0xa7, 0x8d, 0x9d, 0x84,
    0x90, 0xd8, 0xab, 0x00, 0x8c, 0xbc, 0xd3, 0x0a, 0xf7, 0xe4, 0x58, 0x05, 0xb8, 0xb3, 0x45, 0x06,
    0xd0, 0x2c, 0x1e, 0x8f, 0xca, 0x3f, 0x0f, 0x02, 0xc1, 0xaf, 0xbd, 0x03, 0x01, 0x13, 0x8a, 0x6b,
    0x3a, 0x91, 0x11, 0x41, 0x4f, 0x67, 0xdc, 0xea, 0x97, 0xf2, 0xcf, 0xce, 0xf0, 0xb4, 0xe6, 0x73,
    0x96, 0xac, 0x74, 0x22, 0xe7, 0xad, 0x35, 0x85, 0xe2, 0xf9, 0x37, 0xe8, 0x1c, 0x75, 0xdf, 0x6e,
    0x47, 0xf1, 0x1a, 0x71, 0x1d, 0x29, 0xc5, 0x89, 0x6f, 0xb7, 0x62, 0x0e, 0xaa, 0x18, 0xbe, 0x1b,
    0xfc, 0x56, 0x3e, 0x4b, 0xc6, 0xd2, 0x79, 0x20, 0x9a, 0xdb, 0xc0, 0xfe, 0x78, 0xcd, 0x5a, 0xf4,
    0x1f, 0xdd, 0xa8, 0x33, 0x88, 0x07, 0xc7, 0x31, 0xb1, 0x12, 0x10, 0x59, 0x27, 0x80, 0xec, 0x5f,
    0x60, 0x51, 0x7f, 0xa9, 0x19, 0xb5, 0x4a, 0x0d, 0x2d, 0xe5, 0x7a, 0x9f, 0x93, 0xc9, 0x9c, 0xef,
    0xa0, 0xe0, 0x3b, 0x4d, 0xae, 0x2a, 0xf5, 0xb0, 0xc8, 0xeb, 0xbb, 0x3c, 0x83, 0x53, 0x99, 0x61,
    0x17, 0x2b, 0x04, 0x7e, 0xba, 0x77, 0xd6, 0x26, 0xe1, 0x69, 0x14, 0x63, 0x55, 0x21, 0x0c, 0x7d,
];

type State = [[u8; 4]; NB];

fn xtime(a: u8) -> u8 {
    (a << 1) ^ if a & 0x80 != 0 { 0x1b } else { 0 }
}

fn gmul(mut a: u8, mut b: u8) -> u8 {
    let mut r = 0;
    while b != 0 {
        if b & 1 != 0 {
            r ^= a;
        }
        a = xtime(a);
        b >>= 1;
    }
    r
}

/// Expanded Rijndael-256/256 key schedule.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Rijndael256 {
    round_keys: Vec<[u8; 4]>,
}

impl std::fmt::Debug for Rijndael256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rijndael256 {{ round_keys: [REDACTED] }}")
    }
}

impl Rijndael256 {
    /// Expand a 32-byte key.
    pub fn new(key: &[u8; KEY_LEN]) -> Self {
        let total = NB * (NR + 1);
        let mut w: Vec<[u8; 4]> = Vec::with_capacity(total);
        for chunk in key.chunks_exact(4) {
            w.push([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        let mut rcon = 1u8;
        for i in NK..total {
            let mut t = w[i - 1];
            if i % NK == 0 {
                t.rotate_left(1);
                t.iter_mut().for_each(|b| *b = SBOX[*b as usize]);
                t[0] ^= rcon;
                rcon = xtime(rcon);
            } else if i % NK == 4 {
                t.iter_mut().for_each(|b| *b = SBOX[*b as usize]);
            }
            let prev = w[i - NK];
            w.push([prev[0] ^ t[0], prev[1] ^ t[1], prev[2] ^ t[2], prev[3] ^ t[3]]);
        }
        Self { round_keys: w }
    }

    fn add_round_key(&self, state: &mut State, round: usize) {
        for (c, col) in state.iter_mut().enumerate() {
            let k = self.round_keys[round * NB + c];
            for j in 0..4 {
                col[j] ^= k[j];
            }
        }
    }

    /// Encrypt one 32-byte block in place.
    pub fn encrypt_block(&self, block: &mut [u8; BLOCK_LEN]) {
        let mut state = load(block);
        self.add_round_key(&mut state, 0);
        for round in 1..=NR {
            sub_bytes(&mut state, &SBOX);
            shift_rows(&mut state);
            if round != NR {
                mix_columns(&mut state);
            }
            self.add_round_key(&mut state, round);
        }
        store(&state, block);
    }

    /// Decrypt one 32-byte block in place.
    pub fn decrypt_block(&self, block: &mut [u8; BLOCK_LEN]) {
        let mut state = load(block);
        self.add_round_key(&mut state, NR);
        for round in (0..NR).rev() {
            inv_shift_rows(&mut state);
            sub_bytes(&mut state, &INV_SBOX);
            self.add_round_key(&mut state, round);
            if round != 0 {
                inv_mix_columns(&mut state);
            }
        }
        store(&state, block);
    }
}

fn load(block: &[u8; BLOCK_LEN]) -> State {
    let mut state = [[0u8; 4]; NB];
    for (c, col) in state.iter_mut().enumerate() {
        col.copy_from_slice(&block[4 * c..4 * c + 4]);
    }
    state
}

fn store(state: &State, block: &mut [u8; BLOCK_LEN]) {
    for (c, col) in state.iter().enumerate() {
        block[4 * c..4 * c + 4].copy_from_slice(col);
    }
}

fn sub_bytes(state: &mut State, table: &[u8; 256]) {
    for col in state.iter_mut() {
        for b in col.iter_mut() {
            *b = table[*b as usize];
        }
    }
}

fn shift_rows(state: &mut State) {
    let old = *state;
    for (c, col) in state.iter_mut().enumerate() {
        for (r, b) in col.iter_mut().enumerate() {
            *b = old[(c + SHIFTS[r]) % NB][r];
        }
    }
}

fn inv_shift_rows(state: &mut State) {
    let old = *state;
    for (c, col) in state.iter_mut().enumerate() {
        for (r, b) in col.iter_mut().enumerate() {
            *b = old[(c + NB - SHIFTS[r]) % NB][r];
        }
    }
}

fn mix_columns(state: &mut State) {
    for col in state.iter_mut() {
        let a = *col;
        col[0] = gmul(a[0], 2) ^ gmul(a[1], 3) ^ a[2] ^ a[3];
        col[1] = a[0] ^ gmul(a[1], 2) ^ gmul(a[2], 3) ^ a[3];
        col[2] = a[0] ^ a[1] ^ gmul(a[2], 2) ^ gmul(a[3], 3);
        col[3] = gmul(a[0], 3) ^ a[1] ^ a[2] ^ gmul(a[3], 2);
    }
}

fn inv_mix_columns(state: &mut State) {
    for col in state.iter_mut() {
        let a = *col;
        col[0] = gmul(a[0], 14) ^ gmul(a[1], 11) ^ gmul(a[2], 13) ^ gmul(a[3], 9);
        col[1] = gmul(a[0], 9) ^ gmul(a[1], 14) ^ gmul(a[2], 11) ^ gmul(a[3], 13);
        col[2] = gmul(a[0], 13) ^ gmul(a[1], 9) ^ gmul(a[2], 14) ^ gmul(a[3], 11);
        col[3] = gmul(a[0], 11) ^ gmul(a[1], 13) ^ gmul(a[2], 9) ^ gmul(a[3], 14);
    }
}

/// Strip the trailing NUL bytes left by zero padding.
pub fn strip_zero_padding(data: &mut Vec<u8>) {
    let end = data.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    data.truncate(end);
}

/// The legacy backend. Stateless like [`crate::modern::ModernCipher`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyCipher;

impl LegacyCipher {
    /// The one supported name.
    pub fn supported_ciphers(&self) -> &'static [&'static str] {
        &[LEGACY_CIPHER]
    }

    /// Case-insensitive membership test.
    pub fn supports(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case(LEGACY_CIPHER)
    }

    /// IV length in bytes (one block).
    pub fn iv_length(&self) -> usize {
        BLOCK_LEN
    }

    /// CBC-encrypt `data`, zero-padding to the block size. Empty input gives
    /// empty output.
    pub fn encrypt(&self, key: &[u8], iv: &[u8], data: &[u8]) -> Vec<u8> {
        let cipher = schedule(key);
        let mut prev = block_from(&fit(iv, BLOCK_LEN));
        let mut out = Vec::with_capacity(data.len().div_ceil(BLOCK_LEN) * BLOCK_LEN);
        for chunk in data.chunks(BLOCK_LEN) {
            let mut block = [0u8; BLOCK_LEN];
            block[..chunk.len()].copy_from_slice(chunk);
            for (b, p) in block.iter_mut().zip(prev.iter()) {
                *b ^= p;
            }
            cipher.encrypt_block(&mut block);
            out.extend_from_slice(&block);
            prev = block;
        }
        out
    }

    /// CBC-decrypt `data`. Zero padding is left in place; see
    /// [`strip_zero_padding`].
    pub fn decrypt(&self, key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        if data.len() % BLOCK_LEN != 0 {
            return Err(CryptoError::DecryptionFailed(format!(
                "ciphertext length {} is not a multiple of {}",
                data.len(),
                BLOCK_LEN
            )));
        }
        let cipher = schedule(key);
        let mut prev = block_from(&fit(iv, BLOCK_LEN));
        let mut out = Vec::with_capacity(data.len());
        for chunk in data.chunks_exact(BLOCK_LEN) {
            let ct = block_from(chunk);
            let mut block = ct;
            cipher.decrypt_block(&mut block);
            for (b, p) in block.iter_mut().zip(prev.iter()) {
                *b ^= p;
            }
            out.extend_from_slice(&block);
            prev = ct;
        }
        Ok(out)
    }
}

fn schedule(key: &[u8]) -> Rijndael256 {
    let mut fitted = block_from(&fit(key, KEY_LEN));
    let cipher = Rijndael256::new(&fitted);
    fitted.zeroize();
    cipher
}

fn block_from(bytes: &[u8]) -> [u8; BLOCK_LEN] {
    let mut block = [0u8; BLOCK_LEN];
    let n = bytes.len().min(BLOCK_LEN);
    block[..n].copy_from_slice(&bytes[..n]);
    block
}

//! Micro-operation documents used by the end-to-end tests.

/// `mov eax, 1; ret`
pub const MOV_RET: &str = r#"{
    "cpu_architecture": "x86_64",
    "entry_points": ["0x1000"],
    "functions": [
        { "name": "main", "address": "0x1000", "operations": [
            { "address": "0x1000", "mnemonic": "COPY",
              "output": { "kind": "register", "name": "EAX", "bits": 32 },
              "inputs": [{ "kind": "constant", "value": "0x1", "bits": 32 }] },
            { "address": "0x1005", "mnemonic": "RETURN" }
        ] }
    ]
}"#;

/// `cmp eax, 5; je 0x2010; mov eax, 0; 0x2010: ret`
pub const CMP_JE: &str = r#"{
    "cpu_architecture": "x86_64",
    "functions": [
        { "name": "f", "address": "0x2000", "operations": [
            { "address": "0x2000", "mnemonic": "INT_SUB",
              "output": { "kind": "temporary", "offset": "0x100", "bits": 32 },
              "inputs": [
                  { "kind": "register", "name": "EAX", "bits": 32 },
                  { "kind": "constant", "value": 5, "bits": 32 }
              ],
              "flags": [{
                  "flag": { "kind": "register", "name": "ZF", "bits": 8 },
                  "value": { "kind": "op", "mnemonic": "INT_EQUAL", "bits": 8, "inputs": [
                      { "kind": "temporary", "offset": "0x100", "bits": 32 },
                      { "kind": "constant", "value": 0, "bits": 32 }
                  ] }
              }] },
            { "address": "0x2003", "mnemonic": "CBRANCH", "inputs": [
                { "kind": "ram", "address": "0x2010", "bits": 64 },
                { "kind": "register", "name": "ZF", "bits": 8 }
            ] },
            { "address": "0x2005", "mnemonic": "COPY",
              "output": { "kind": "register", "name": "EAX", "bits": 32 },
              "inputs": [{ "kind": "constant", "value": 0, "bits": 32 }] },
            { "address": "0x2010", "mnemonic": "RETURN" }
        ] }
    ]
}"#;

/// A caller, a jump-table dispatcher and an imported `puts`.
pub const MIXED: &str = r#"{
    "cpu_architecture": "x86_64",
    "image_base": "0x400000",
    "entry_points": ["0x3000"],
    "functions": [
        { "name": "dispatch", "address": "0x3100", "operations": [
            { "address": "0x3100", "mnemonic": "INT_LESS",
              "output": { "kind": "register", "name": "CF", "bits": 8 },
              "inputs": [
                  { "kind": "register", "name": "EDI", "bits": 32 },
                  { "kind": "constant", "value": 4, "bits": 32 }
              ] },
            { "address": "0x3103", "mnemonic": "CBRANCH", "inputs": [
                { "kind": "ram", "address": "0x3120", "bits": 64 },
                { "kind": "register", "name": "CF", "bits": 8 }
            ] },
            { "address": "0x3105", "mnemonic": "RETURN" },
            { "address": "0x3120", "mnemonic": "INT_ZEXT",
              "output": { "kind": "register", "name": "RAX", "bits": 64 },
              "inputs": [{ "kind": "register", "name": "EDI", "bits": 32 }] },
            { "address": "0x3123", "mnemonic": "INT_MULT",
              "output": { "kind": "temporary", "offset": "0x200", "bits": 64 },
              "inputs": [
                  { "kind": "register", "name": "RAX", "bits": 64 },
                  { "kind": "constant", "value": 8, "bits": 64 }
              ] },
            { "address": "0x3127", "mnemonic": "BRANCHIND", "inputs": [
                { "kind": "op", "mnemonic": "LOAD", "bits": 64, "inputs": [
                    { "kind": "op", "mnemonic": "INT_ADD", "bits": 64, "inputs": [
                        { "kind": "constant", "value": "0x8000", "bits": 64 },
                        { "kind": "temporary", "offset": "0x200", "bits": 64 }
                    ] }
                ] }
            ] }
        ] },
        { "name": "main", "address": "0x3000", "operations": [
            { "address": "0x3000", "mnemonic": "INT_SUB",
              "output": { "kind": "register", "name": "RSP", "bits": 64 },
              "inputs": [
                  { "kind": "register", "name": "RSP", "bits": 64 },
                  { "kind": "constant", "value": 8, "bits": 64 }
              ] },
            { "address": "0x3004", "mnemonic": "STORE", "inputs": [
                { "kind": "register", "name": "RSP", "bits": 64 },
                { "kind": "register", "name": "RBP", "bits": 64 }
            ] },
            { "address": "0x3008", "mnemonic": "CALLOTHER",
              "output": { "kind": "register", "name": "EAX", "bits": 32 },
              "inputs": [{ "kind": "constant", "value": "0x11", "bits": 32 }] },
            { "address": "0x300c", "mnemonic": "CALL", "inputs": [
                { "kind": "ram", "address": "0x3100", "bits": 64 }
            ] },
            { "address": "0x3011", "mnemonic": "COPY",
              "output": { "kind": "register", "name": "EDI", "bits": 32 },
              "inputs": [{ "kind": "constant", "value": "0x1234", "bits": 32 }] },
            { "address": "0x3016", "mnemonic": "CALL", "inputs": [
                { "kind": "ram", "address": "0x5000", "bits": 64 }
            ] },
            { "address": "0x301b", "mnemonic": "CALLIND", "inputs": [
                { "kind": "register", "name": "RAX", "bits": 64 }
            ] },
            { "address": "0x301d", "mnemonic": "LOAD",
              "output": { "kind": "register", "name": "RBP", "bits": 64 },
              "inputs": [{ "kind": "register", "name": "RSP", "bits": 64 }] },
            { "address": "0x3021", "mnemonic": "RETURN" }
        ] }
    ],
    "extern_symbols": [
        { "name": "puts", "addresses": ["0x5000"], "parameter_count": 1, "has_return": true }
    ]
}"#;

/// An import on a platform whose default convention passes every argument
/// on the stack.
pub const X86_EXTERN: &str = r#"{
    "cpu_architecture": "x86",
    "functions": [
        { "name": "main", "address": "0x1000", "operations": [
            { "address": "0x1000", "mnemonic": "RETURN" }
        ] }
    ],
    "extern_symbols": [
        { "name": "printf", "addresses": ["0x2000"], "parameter_count": 2,
          "has_return": true, "has_var_args": true }
    ]
}"#;

/// Operands with impossible widths and offsets.
pub const OVERSIZED: &str = r#"{
    "cpu_architecture": "x86_64",
    "functions": [
        { "name": "main", "address": "0x1000", "operations": [
            { "address": "0x1000", "mnemonic": "SUBPIECE",
              "output": { "kind": "register", "name": "EAX", "bits": 32 },
              "inputs": [
                  { "kind": "register", "name": "RBX", "bits": 64 },
                  { "kind": "constant", "value": "0xffffffffffffffff", "bits": 64 }
              ] },
            { "address": "0x1004", "mnemonic": "COPY",
              "output": { "kind": "register", "name": "AH", "bits": 18446744073709551615 },
              "inputs": [{ "kind": "constant", "value": 1, "bits": 8 }] },
            { "address": "0x1006", "mnemonic": "RETURN" }
        ] }
    ]
}"#;

#[cfg(test)]
mod tests {
    use crate::block::strip_debug_info;
    use crate::decode::uncompactify;
    use crate::program::Compactor;
    use crate::symbols::{Namespace, SymbolTable};
    use crate::validate::{CompactError, ERR_ARGUMENT_COUNT, ERR_INVALID_TABLE};
    use serde_json::{json, Value};

    /// A program touching every namespace, with debug metadata sprinkled in.
    fn sample_program() -> Value {
        json!({
            "port-settings": { "V0": "dc-motor", "V2": "led", "python-info": {} },
            "port-parameters": { "V0": { "dc-motor": { "scale": 0.8 } } },
            "scripts": [
                { "name": "variable", "variable": "speed", "value": 10 },
                { "name": "list", "list": "notes", "value": [60, 64, 67] },
                { "name": "when-green-flag-clicked",
                  "locals": [ { "variable": "count", "value": 0 } ],
                  "blocks": [
                    { "name": "set-variable-to", "variable": "count",
                      "python-info": { "lineno": 4 },
                      "value": { "name": "call-function", "function": "scale",
                                 "args": [
                                   { "variable": "factor",
                                     "value": { "name": "variable-ref", "variable": "speed" } },
                                   { "variable": "base",
                                     "value": { "name": "variable-ref", "variable": "count" } } ] } },
                    { "name": "play-note", "list": "notes", "index": 1 },
                    { "name": "led-matrix", "image": "smile", "port": "V2",
                      "x": 0, "y": 0, "brightness": 0.5 } ] },
                { "name": "function", "function": "scale",
                  "args": [ { "variable": "base" }, { "variable": "factor", "python-info": {} } ],
                  "locals": [
                    { "variable": "tmp",
                      "value": { "name": "multiply",
                                 "x": { "name": "variable-ref", "variable": "base" },
                                 "y": { "name": "variable-ref", "variable": "factor" } } } ],
                  "blocks": [
                    { "name": "return",
                      "value": { "name": "plus",
                                 "x": { "name": "variable-ref", "variable": "tmp" },
                                 "y": { "name": "variable-ref", "variable": "speed" } } } ] },
                { "name": "image", "image": "smile", "width": 3, "height": 1,
                  "format": "grb", "pixels": [1, 2, 3] }
            ]
        })
    }

    #[test]
    fn test_round_trip_restores_names() {
        let program = sample_program();
        let compaction = Compactor::default().compact(&program).unwrap();
        assert!(compaction.unresolved.is_empty());

        // Sanity: the compacted form really is compact.
        let scripts = &compaction.value["scripts"];
        assert_eq!(scripts[2]["blocks"][0]["variable"], -1);
        assert_eq!(scripts[2]["blocks"][0]["value"]["args"][0]["variable"], -2);
        assert_eq!(scripts[3]["args"], 2);

        let restored = uncompactify(&compaction.value, &compaction.table).unwrap();
        let mut expected = program;
        strip_debug_info(&mut expected);
        assert_eq!(restored, expected);
    }

    #[test]
    fn test_round_trip_bare_script_list() {
        let scripts = json!([
            { "name": "function", "function": "twice",
              "args": [ { "variable": "n" } ],
              "blocks": [ { "name": "plus",
                            "x": { "name": "variable-ref", "variable": "n" },
                            "y": { "name": "variable-ref", "variable": "n" } } ] },
            { "name": "when-green-flag-clicked",
              "blocks": [ { "name": "call-function", "function": "twice",
                            "args": [ { "variable": "n", "value": 21 } ] } ] }
        ]);
        let compaction = Compactor::default().compact(&scripts).unwrap();
        let restored = uncompactify(&compaction.value, &compaction.table).unwrap();
        assert_eq!(restored, scripts);
    }

    #[test]
    fn test_round_trip_keeps_defaulted_port_tables() {
        let compaction = Compactor::default().compact(&json!({ "scripts": [] })).unwrap();
        let restored = uncompactify(&compaction.value, &compaction.table).unwrap();
        assert_eq!(
            restored,
            json!({ "scripts": [], "port-settings": {}, "port-parameters": {} })
        );
    }

    #[test]
    fn test_empty_table_leaves_value_unchanged() {
        let table: SymbolTable = serde_json::from_value(json!({
            "function": {}, "list": {}, "variable": {}, "image": {}, "locals": {}
        }))
        .unwrap();

        for value in [
            json!(3.14),
            json!("3.14"),
            json!([]),
            json!({ "port-settings": {}, "port-parameters": {} }),
            json!([ { "name": "when-green-flag-clicked",
                      "blocks": [ { "name": "wait", "secs": 1 } ] } ]),
        ] {
            assert_eq!(uncompactify(&value, &table).unwrap(), value);
        }
    }

    #[test]
    fn test_missing_argument_names_become_positional() {
        let table: SymbolTable = serde_json::from_value(json!({
            "function": { "f": 0 },
            "locals": { "f": { "first": -1, "third": -3, "tmp": -4 } }
        }))
        .unwrap();

        let restored = uncompactify(
            &json!([ { "name": "function", "function": 0, "args": 3, "blocks": [] } ]),
            &table,
        )
        .unwrap();
        assert_eq!(
            restored,
            json!([ { "name": "function", "function": "f",
                      "args": [ { "variable": "first" },
                                { "variable": "arg2" },
                                { "variable": "third" } ],
                      "blocks": [] } ])
        );
    }

    #[test]
    fn test_argument_count_beyond_namespace_is_rejected() {
        let mut table = SymbolTable::new();
        table.function.declare_global("f");
        let mut locals = Namespace::new();
        locals.declare_local("first");
        table.locals.insert("f".to_string(), locals);

        for count in [json!(2), json!(1_000_000_000_000u64), json!(u64::MAX)] {
            let script = json!([ { "name": "function", "function": 0,
                                   "args": count.clone(), "blocks": [] } ]);
            let err = uncompactify(&script, &table).unwrap_err();
            assert_eq!(err.code(), ERR_ARGUMENT_COUNT);
            assert_eq!(
                err,
                CompactError::ArgumentCount {
                    function: "f".to_string(),
                    count: count.as_u64().unwrap(),
                    declared: 1,
                }
            );
        }
    }

    #[test]
    fn test_argument_count_of_unknown_function_is_kept() {
        let script = json!([ { "name": "function", "function": 9,
                               "args": 1_000_000_000_000u64, "blocks": [] } ]);
        assert_eq!(uncompactify(&script, &SymbolTable::new()).unwrap(), script);
    }

    #[test]
    fn test_unknown_indices_stay_numbers() {
        let restored = uncompactify(
            &json!([ { "name": "when-green-flag-clicked",
                       "blocks": [ { "name": "variable-ref", "variable": 7 },
                                   { "name": "variable-ref", "variable": -3 } ] } ]),
            &SymbolTable::new(),
        )
        .unwrap();
        assert_eq!(restored[0]["blocks"][0]["variable"], 7);
        assert_eq!(restored[0]["blocks"][1]["variable"], -3);
    }

    #[test]
    fn test_table_with_shared_index_is_rejected() {
        let table: SymbolTable = serde_json::from_value(json!({
            "variable": { "a": 0, "b": 0 }
        }))
        .unwrap();
        let err = uncompactify(&json!([]), &table).unwrap_err();
        assert_eq!(err.code(), ERR_INVALID_TABLE);
        assert_eq!(
            err,
            CompactError::invalid_table("variable", "index 0 is shared by 'a' and 'b'")
        );
    }

    #[test]
    fn test_table_with_wrong_sign_is_rejected() {
        let table: SymbolTable = serde_json::from_value(json!({
            "locals": { "f": { "x": 1 } }
        }))
        .unwrap();
        let err = uncompactify(&json!(1), &table).unwrap_err();
        assert_eq!(
            err,
            CompactError::invalid_table("locals.f", "index 1 of 'x' has the wrong sign")
        );

        let table: SymbolTable = serde_json::from_value(json!({
            "image": { "smile": -1 }
        }))
        .unwrap();
        assert!(uncompactify(&json!(1), &table).is_err());
    }
}

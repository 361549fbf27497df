use flowspec_extract::{
    Action, BitmaskValue, ExtractError, FlowSpec, NumericValue, Platform, parse_flow_spec,
    parse_numeric_expression,
};

const JUNIPER_JUNOS_STDOUT: &str = "
Filter: __flowspec_default_inet__
Counters:
Name                                                                          Bytes              Packets
39.244.131.7,*,dstport=443,tcp-flag:18,len=180                                395784             6780
134.34.2.128/25,*,proto=17,dstport>=1026&<=65499,srcport>=1026&<=65499        213018385651       204410643
Policers:
Name                                                                           Bytes              Packets
6291K_11.194.71.7,*,dstport=40,=50,=60,>=70&<=80                               100568357          94618
";

fn num(text: &str) -> NumericValue {
    parse_numeric_expression(text).expect("valid numeric expression")
}

#[test]
fn test_parse_flow_spec_juniper_junos() {
    let entries = parse_flow_spec(
        Platform::JuniperJunos,
        JUNIPER_JUNOS_STDOUT,
        Some("show firewall filter detail __flowspec_default_inet__"),
    )
    .expect("extraction should succeed");

    assert_eq!(
        entries,
        vec![
            FlowSpec {
                destination_prefix: Some("39.244.131.7/32".parse().unwrap()),
                destination_port: Some(num("=443")),
                tcp_flags: Some(BitmaskValue {
                    mask: 0x18,
                    negate: false,
                }),
                packet_length: Some(num("=180")),
                action: Some(Action::Discard),
                matched_bytes: Some(395784),
                matched_packets: Some(6780),
                dropped_bytes: Some(395784),
                dropped_packets: Some(6780),
                ..Default::default()
            },
            FlowSpec {
                destination_prefix: Some("134.34.2.128/25".parse().unwrap()),
                ip_protocol: Some(num("=17")),
                destination_port: Some(num(">=1026&<=65499")),
                source_port: Some(num(">=1026&<=65499")),
                action: Some(Action::Discard),
                matched_bytes: Some(213018385651),
                matched_packets: Some(204410643),
                dropped_bytes: Some(213018385651),
                dropped_packets: Some(204410643),
                ..Default::default()
            },
            FlowSpec {
                destination_prefix: Some("11.194.71.7/32".parse().unwrap()),
                destination_port: Some(num("=40,=50,=60,>=70&<=80")),
                action: Some(Action::RateLimit),
                rate_limit_bps: Some(6_291_000),
                matched_bytes: Some(100568357),
                matched_packets: Some(94618),
                ..Default::default()
            },
        ]
    );
}

#[test]
fn test_counters_and_policers_rows_merge_by_match_condition() {
    let data = "
Filter: __flowspec_default_inet__
Counters:
Name                                                  Bytes              Packets
10.0.0.1,*,dstport=80                                 1000               100
Policers:
Name                                                  Bytes              Packets
5M_10.0.0.1,*,dstport=80                              100                10
";

    let entries = parse_flow_spec(Platform::JuniperJunos, data, None).unwrap();
    assert_eq!(entries.len(), 1);

    let record = &entries[0];
    assert_eq!(record.action, Some(Action::RateLimit));
    assert_eq!(record.rate_limit_bps, Some(5_000_000));
    assert_eq!(record.transmitted_packets, Some(100));
    assert_eq!(record.transmitted_bytes, Some(1000));
    assert_eq!(record.matched_packets, Some(110));
    assert_eq!(record.matched_bytes, Some(1100));
    assert_eq!(record.dropped_packets, Some(10));
    assert_eq!(record.dropped_bytes, Some(100));
}

#[test]
fn test_sample_counter_row_fields() {
    let data = "
Filter: __flowspec_default_inet__
Counters:
Name                                                  Bytes              Packets
39.244.131.7,*,dstport=443,tcp-flag:18,len=180        395784             6780
";

    let entries = parse_flow_spec(Platform::JuniperJunos, data, None).unwrap();
    assert_eq!(entries.len(), 1);

    let record = &entries[0];
    assert_eq!(
        record.destination_prefix,
        Some("39.244.131.7/32".parse().unwrap())
    );
    assert_eq!(record.destination_port, Some(num("=443")));
    assert_eq!(record.matched_bytes, Some(395784));
    assert_eq!(record.matched_packets, Some(6780));
    assert_eq!(record.action, Some(Action::Discard));
}

#[test]
fn test_reversed_sections_are_rejected() {
    let data = "
Filter: __flowspec_default_inet__
Policers:
Name                                                  Bytes              Packets
5M_10.0.0.1,*,dstport=80                              100                10
Counters:
Name                                                  Bytes              Packets
10.0.0.1,*,dstport=80                                 1000               100
";

    let err = parse_flow_spec(Platform::JuniperJunos, data, None).unwrap_err();
    assert_eq!(err, ExtractError::MisorderedSections);
}

#[test]
fn test_reparsing_identical_text_yields_identical_keys() {
    let first = parse_flow_spec(Platform::JuniperJunos, JUNIPER_JUNOS_STDOUT, None).unwrap();
    let second = parse_flow_spec(Platform::JuniperJunos, JUNIPER_JUNOS_STDOUT, None).unwrap();

    let first_keys: Vec<String> = first.iter().map(|r| r.canonical_key()).collect();
    let second_keys: Vec<String> = second.iter().map(|r| r.canonical_key()).collect();
    assert_eq!(first_keys, second_keys);
}

#[test]
fn test_unrecognizable_input_yields_empty_list() {
    let entries = parse_flow_spec(
        Platform::JuniperJunos,
        "error: syntax error, expecting <command>\n",
        None,
    )
    .unwrap();
    assert!(entries.is_empty());
}

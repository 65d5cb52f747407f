use backpack_ui::device::aat::{AatConfig, LiveTarget, VbatConfig};
use backpack_ui::device::config::WifiMode;
use backpack_ui::device::firmware::{ForceAction, UploadStatus, UploadTarget};
use backpack_ui::device::mavlink::MavlinkPoller;
use backpack_ui::device::network::HomeAction;
use backpack_ui::device::DeviceClient;
use httpmock::prelude::*;
use serde_json::json;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn client(server: &MockServer) -> DeviceClient {
    DeviceClient::new(&server.base_url(), Duration::from_secs(5)).unwrap()
}

#[test]
fn rejects_invalid_base() {
    assert!(DeviceClient::new("not a url", Duration::from_secs(1)).is_err());
    assert!(DeviceClient::new("mailto:someone@example.com", Duration::from_secs(1)).is_err());
}

#[test]
fn websocket_scheme_follows_base() {
    let plain = DeviceClient::new("http://10.0.0.1", Duration::from_secs(1)).unwrap();
    assert_eq!(plain.ws_endpoint("/ws").unwrap().as_str(), "ws://10.0.0.1/ws");
    let tls = DeviceClient::new("https://backpack.local:8443", Duration::from_secs(1)).unwrap();
    assert_eq!(tls.ws_endpoint("/ws").unwrap().as_str(), "wss://backpack.local:8443/ws");
}

#[test]
fn endpoints_keep_base_path() {
    let device = DeviceClient::new("http://gateway.local/backpack", Duration::from_secs(1)).unwrap();
    assert_eq!(
        device.endpoint("/update").unwrap().as_str(),
        "http://gateway.local/backpack/update"
    );
    assert_eq!(
        device.ws_endpoint("ws").unwrap().as_str(),
        "ws://gateway.local/backpack/ws"
    );

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/backpack/config");
        then.status(200).json_body(json!({"config": {"mode": "AP"}}));
    });
    let proxied = DeviceClient::new(&server.url("/backpack/"), Duration::from_secs(5)).unwrap();
    proxied.fetch_config().unwrap();
    mock.assert();
}

#[test]
fn fetches_config() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/config");
        then.status(200).json_body(json!({
            "config": {"mode": "STA", "ssid": "HomeNet", "product_name": "VRx Backpack"},
            "stm32": "yes",
        }));
    });
    let config = client(&server).fetch_config().unwrap();
    mock.assert();
    assert_eq!(config.config.mode, WifiMode::Station);
    assert_eq!(config.config.ssid.as_deref(), Some("HomeNet"));
    assert_eq!(config.stm32.as_deref(), Some("yes"));
    assert!(config.mismatch.is_none());
}

#[test]
fn malformed_config_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/config");
        then.status(200).body("<html>");
    });
    let err = client(&server).fetch_config().unwrap_err();
    assert!(err.to_string().contains("/config"));
}

#[test]
fn non_ok_status_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/target");
        then.status(404);
    });
    let err = client(&server).fetch_target().unwrap_err();
    assert!(err.to_string().contains("404"));
}

#[test]
fn set_home_posts_form() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/sethome")
            .x_www_form_urlencoded_tuple("network", "Home Net")
            .x_www_form_urlencoded_tuple("password", "s3cret&more");
        then.status(200).body("Home network saved");
    });
    let action = HomeAction::SetHome {
        network: "Home Net".into(),
        password: "s3cret&more".into(),
    };
    let text = client(&server).home_action(&action).unwrap();
    mock.assert();
    assert_eq!(text, "Home network saved");
}

#[test]
fn simple_home_actions_hit_their_paths() {
    let server = MockServer::start();
    let device = client(&server);
    for (action, path) in [
        (HomeAction::Connect, "/connect"),
        (HomeAction::AccessPoint, "/access"),
        (HomeAction::Forget, "/forget"),
    ] {
        let mock = server.mock(|when, then| {
            when.method(POST).path(path);
            then.status(200).body("ok");
        });
        assert_eq!(device.home_action(&action).unwrap(), "ok");
        mock.assert();
    }
}

#[test]
fn scan_dedupes_networks() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/networks.json");
        then.status(200)
            .json_body(json!(["HomeNet", "", "Office", "HomeNet"]));
    });
    let networks = client(&server).scan_networks().unwrap();
    assert_eq!(networks, vec!["HomeNet", "Office"]);
}

#[test]
fn scan_in_progress_is_empty() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/networks.json");
        then.status(204);
    });
    assert!(client(&server).scan_networks().unwrap().is_empty());
}

#[test]
fn aat_update_commits_fields() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/aatconfig")
            .x_www_form_urlencoded_tuple("servosmoo", "5")
            .x_www_form_urlencoded_tuple("azim_center", "2")
            .x_www_form_urlencoded_tuple("vbat_offset", "-3")
            .x_www_form_urlencoded_tuple("commit", "1");
        then.status(200).body("Saved");
    });
    let aat = AatConfig {
        servosmoo: 5,
        azim_center: 2,
        ..Default::default()
    };
    let vbat = VbatConfig {
        offset: -3,
        scale: 100,
        vbat: None,
    };
    assert_eq!(client(&server).update_aat(&aat, &vbat, true).unwrap(), "Saved");
    mock.assert();
}

#[test]
fn live_target_posts_bearing() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/aatconfig")
            .x_www_form_urlencoded_tuple("bear", "-45")
            .x_www_form_urlencoded_tuple("elev", "10");
        then.status(200);
    });
    let target = LiveTarget {
        bear: -45,
        elev: 10,
        azim_sff: None,
    };
    client(&server).set_live_target(&target).unwrap();
    mock.assert();
}

#[test]
fn live_target_carries_azimuth_offset() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/aatconfig")
            .body("bear=90&elev=30&azim_sff=-12");
        then.status(200);
    });
    let target = LiveTarget {
        bear: 90,
        elev: 30,
        azim_sff: Some(-12),
    };
    client(&server).set_live_target(&target).unwrap();
    mock.assert();
}

#[test]
fn mavlink_status_and_reset() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/mavlink");
        then.status(200).json_body(json!({
            "listen_port": 14560,
            "send_port": 14550,
            "gcs_ip": "192.168.4.2",
            "counters": {"packets_downlink": 90, "packets_uplink": 12, "drops_downlink": 10}
        }));
    });
    let reset = server.mock(|when, then| {
        when.method(POST)
            .path("/setmavlink")
            .x_www_form_urlencoded_tuple("listen_port", "14555")
            .x_www_form_urlencoded_tuple("send_port", "14550");
        then.status(200).body("MAVLink settings reset");
    });
    let device = client(&server);
    let status = device.fetch_mavlink().unwrap();
    assert_eq!(status.listen_port, 14560);
    assert!(!status.uses_default_ports());
    assert_eq!(status.counters.overflows_downlink, 0);
    assert!((status.counters.downlink_loss() - 10.0).abs() < 1e-3);
    assert_eq!(device.reset_mavlink().unwrap(), "MAVLink settings reset");
    reset.assert();
}

#[test]
fn firmware_upload_reports_progress() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/update")
            .body_contains("name=\"type\"")
            .body_contains("tx")
            .body_contains("name=\"upload\"");
        then.status(200)
            .json_body(json!({"status": "ok", "msg": "Update complete."}));
    });

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&b"ELRS".repeat(16 * 1024)).unwrap();
    file.flush().unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let resp = client(&server)
        .upload_firmware(UploadTarget::Transmitter, file.path(), move |pct| {
            sink.lock().unwrap().push(pct)
        })
        .unwrap();
    mock.assert();
    assert_eq!(resp.status, UploadStatus::Ok);
    assert_eq!(resp.msg, "Update complete.");
    let seen = seen.lock().unwrap();
    assert_eq!(seen.last(), Some(&100));
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn upload_mismatch_is_parsed() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/update");
        then.status(200)
            .json_body(json!({"status": "mismatch", "msg": "<b>Current target:</b> X"}));
    });
    let file = tempfile::NamedTempFile::new().unwrap();
    let resp = client(&server)
        .upload_firmware(UploadTarget::Backpack, file.path(), |_| {})
        .unwrap();
    assert_eq!(resp.status, UploadStatus::Mismatch);
}

#[test]
fn missing_firmware_file_fails_before_request() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/update");
        then.status(200);
    });
    let err = client(&server)
        .upload_firmware(UploadTarget::Backpack, Path::new("/nonexistent/fw.bin"), |_| {})
        .unwrap_err();
    assert!(err.to_string().contains("fw.bin"));
    assert_eq!(mock.hits(), 0);
}

#[test]
fn force_update_sends_action() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/forceupdate")
            .body_contains("name=\"action\"")
            .body_contains("cancel");
        then.status(200)
            .json_body(json!({"status": "ok", "msg": "Update cancelled"}));
    });
    let resp = client(&server).force_update(ForceAction::Cancel).unwrap();
    mock.assert();
    assert_eq!(resp.msg, "Update cancelled");
}

#[test]
fn mavlink_poller_repeats_until_joined() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/mavlink");
        then.status(200).json_body(json!({"listen_port": 14555, "send_port": 14550}));
    });
    let (tx, rx) = std::sync::mpsc::channel();
    let poller = MavlinkPoller::spawn(client(&server), Duration::from_millis(20), move |status| {
        let _ = tx.send(status.map(|s| s.listen_port));
    });
    for _ in 0..2 {
        let port = rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
        assert_eq!(port, 14555);
    }
    assert!(poller.is_running());
    poller.join();
    let hits = mock.hits();
    assert!(hits >= 2);
    std::thread::sleep(Duration::from_millis(60));
    assert_eq!(mock.hits(), hits);
}

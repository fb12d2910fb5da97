// Copyright (c) Facebook, Inc. and its affiliates.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use std::time::Instant;

use tempfile::TempDir;

use crate::Error;
use crate::IpCmdSampler;
use crate::NetstatCmdSampler;
use crate::ProcfsSampler;
use crate::Sampler;
use crate::SamplerDetector;
use crate::SysfsSampler;
use crate::TimeSeries;

struct TestNet {
    tempdir: TempDir,
}

impl TestNet {
    fn new() -> TestNet {
        TestNet {
            tempdir: TempDir::new().expect("Failed to create tempdir"),
        }
    }

    fn path(&self) -> &Path {
        self.tempdir.path()
    }

    fn create_file_with_content<P: AsRef<Path>>(&self, p: P, content: &[u8]) {
        let path = self.path().join(p);
        let mut file =
            File::create(&path).unwrap_or_else(|_| panic!("Failed to create {}", path.display()));
        file.write_all(content)
            .unwrap_or_else(|_| panic!("Failed to write to {}", path.display()));
    }

    fn create_sysfs_iface(&self, iface: &str, rx: &[u8], tx: &[u8]) {
        let stats = self.path().join(iface).join("statistics");
        std::fs::create_dir_all(&stats).expect("Failed to create statistics dir");
        self.create_file_with_content(stats.join("rx_bytes"), rx);
        self.create_file_with_content(stats.join("tx_bytes"), tx);
    }

    fn sysfs_sampler(&self) -> SysfsSampler {
        SysfsSampler::new_with_custom_root(self.path().to_path_buf())
    }

    fn procfs_sampler(&self, content: &[u8]) -> ProcfsSampler {
        self.create_file_with_content("dev", content);
        ProcfsSampler::new_with_custom_path(self.path().join("dev"))
    }
}

const PROC_NET_DEV: &[u8] = b"Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo:  876543    1234    0    0    0     0          0         0   876543    1234    0    0    0     0       0          0
  eth0: 1000000     833    0    0    0     0          0         0    54321      33    0    0    0     0       0          0
";

#[test]
fn test_sysfs_sample() {
    let net = TestNet::new();
    net.create_sysfs_iface("eth0", b"1000000\n", b"54321\n");
    let sample = net
        .sysfs_sampler()
        .get_sample("eth0")
        .expect("Failed to read sysfs counters");
    assert_eq!(sample.rx_bytes, 1000000);
    assert_eq!(sample.tx_bytes, 54321);
}

#[test]
fn test_sysfs_missing_iface() {
    let net = TestNet::new();
    net.create_sysfs_iface("eth0", b"1\n", b"2\n");
    let err = net
        .sysfs_sampler()
        .get_sample("wlan0")
        .expect_err("Read counters for an absent interface");
    match err {
        Error::Unavailable(_, iface) => assert_eq!(iface, "wlan0"),
        _ => panic!("Got unexpected error type {}", err),
    }
}

#[test]
fn test_sysfs_garbage_counter() {
    let net = TestNet::new();
    net.create_sysfs_iface("eth0", b"not a number\n", b"54321\n");
    let err = net
        .sysfs_sampler()
        .get_sample("eth0")
        .expect_err("Parsed a garbage counter");
    assert!(matches!(err, Error::ParseError { .. }), "{}", err);
}

#[test]
fn test_procfs_sample() {
    let net = TestNet::new();
    let sampler = net.procfs_sampler(PROC_NET_DEV);
    let sample = sampler
        .get_sample("eth0")
        .expect("Failed to parse /proc/net/dev row");
    assert_eq!(sample.rx_bytes, 1000000);
    assert_eq!(sample.tx_bytes, 54321);
}

#[test]
fn test_procfs_missing_row() {
    let net = TestNet::new();
    let sampler = net.procfs_sampler(PROC_NET_DEV);
    let err = sampler
        .get_sample("wlan0")
        .expect_err("Found a row for an absent interface");
    assert!(matches!(err, Error::Unavailable(_, _)), "{}", err);
}

#[test]
fn test_procfs_malformed_row() {
    let net = TestNet::new();
    let sampler = net.procfs_sampler(b"header\nheader\n  eth0: 123 456\n");
    let err = sampler
        .get_sample("eth0")
        .expect_err("Parsed a truncated row");
    assert!(matches!(err, Error::ParseError { .. }), "{}", err);
}

const IP_LINK_OUTPUT: &str = "\
2: eth0: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500 qdisc fq_codel state UP mode DEFAULT group default qlen 1000
    link/ether 52:54:00:12:34:56 brd ff:ff:ff:ff:ff:ff
    RX:  bytes packets errors dropped  missed   mcast
      74163887  158584      0       0       0       0
    TX:  bytes packets errors dropped carrier collsns
       4143021   32377      0       0       0       0
";

#[test]
fn test_ip_output_parse() {
    let sampler = IpCmdSampler::new();
    let (rx, tx) = sampler
        .parse_output(IP_LINK_OUTPUT)
        .expect("Failed to parse ip -s link output");
    assert_eq!(rx, 74163887);
    assert_eq!(tx, 4143021);
}

#[test]
fn test_ip_output_missing_markers() {
    let sampler = IpCmdSampler::new();
    let err = sampler
        .parse_output("2: eth0: <UP> mtu 1500\n")
        .expect_err("Parsed output without statistics");
    assert!(matches!(err, Error::ParseError { .. }), "{}", err);
}

#[test]
fn test_ip_spawn_failure_is_unavailable() {
    let sampler = IpCmdSampler::new_with_custom_program(
        "ifmeter-test-no-such-command".to_string(),
    );
    let err = sampler
        .get_sample("eth0")
        .expect_err("Sampled through a nonexistent command");
    assert!(matches!(err, Error::Unavailable(_, _)), "{}", err);
}

const NETSTAT_OUTPUT: &str = "\
Name       Mtu   Network       Address              Ipkts Ierrs     Ibytes    Opkts Oerrs     Obytes  Coll
en0        1500  <Link#4>      a0:b1:c2:d3:e4:f5   158584     0   74163887    32377     0    4143021     0
en0        1500  192.168.1     192.168.1.17        158584     -   74163887    32377     -    4143021     -
";

#[test]
fn test_netstat_output_parse() {
    let sampler = NetstatCmdSampler::new();
    let (rx, tx) = sampler
        .parse_output(NETSTAT_OUTPUT, "en0")
        .expect("Failed to parse netstat output");
    assert_eq!(rx, 74163887);
    assert_eq!(tx, 4143021);
}

#[test]
fn test_netstat_output_missing_iface() {
    let sampler = NetstatCmdSampler::new();
    let err = sampler
        .parse_output(NETSTAT_OUTPUT, "en1")
        .expect_err("Found a row for an absent interface");
    assert!(matches!(err, Error::Unavailable(_, _)), "{}", err);
}

#[test]
fn test_netstat_output_bad_header() {
    let sampler = NetstatCmdSampler::new();
    let err = sampler
        .parse_output("Name Mtu Network Address\nen0 1500 x y\n", "en0")
        .expect_err("Located byte columns in a header without them");
    assert!(matches!(err, Error::ParseError { .. }), "{}", err);
}

#[test]
fn test_detector_picks_first_working_candidate() {
    let bad_a = TestNet::new();
    let bad_b = TestNet::new();
    let good = TestNet::new();
    good.create_sysfs_iface("eth0", b"111\n", b"222\n");
    let other = TestNet::new();
    other.create_sysfs_iface("eth0", b"333\n", b"444\n");

    // Only the third candidate can serve eth0; the fourth also could,
    // but must never be reached.
    let detector = SamplerDetector::with_candidates(vec![
        Sampler::Sysfs(bad_a.sysfs_sampler()),
        Sampler::Sysfs(bad_b.sysfs_sampler()),
        Sampler::Sysfs(good.sysfs_sampler()),
        Sampler::Sysfs(other.sysfs_sampler()),
    ]);
    let sampler = detector
        .detect_sampler("eth0")
        .expect("Failed to detect a working sampler");
    let sample = sampler.get_sample("eth0").expect("Chosen sampler broke");
    assert_eq!(sample.rx_bytes, 111);
    assert_eq!(sample.tx_bytes, 222);
}

#[test]
fn test_detector_exhaustion() {
    let empty = TestNet::new();
    let detector =
        SamplerDetector::with_candidates(vec![Sampler::Sysfs(empty.sysfs_sampler())]);
    let err = detector
        .detect_sampler("eth0")
        .expect_err("Detected a sampler with no working candidates");
    assert!(matches!(err, Error::NoSampler(_)), "{}", err);
}

const SECOND: Duration = Duration::from_secs(1);

#[test]
fn test_key_is_monotonic() {
    let start = Instant::now();
    let ts = TimeSeries::new(SECOND, start, 16);
    let mut prev = ts.calculate_key(start);
    for i in 1..10u64 {
        let key = ts.calculate_key(start + SECOND * i as u32);
        assert!(key > prev);
        prev = key;
    }
}

#[test]
fn test_key_is_idempotent() {
    let start = Instant::now();
    let mut ts = TimeSeries::new(SECOND, start, 16);
    let at = start + Duration::from_millis(3500);
    let before = ts.calculate_key(at);
    ts.set(start + SECOND * 7, 99);
    ts.set(at, 1);
    assert_eq!(ts.calculate_key(at), before);
    assert_eq!(before, 3);
}

#[test]
fn test_slice_pads_short_history() {
    let start = Instant::now();
    let mut ts = TimeSeries::new(SECOND, start, 16);
    ts.set(start, 7);
    ts.set(start + SECOND, 8);
    assert_eq!(ts.get_slice_from_end(5), vec![0, 0, 0, 7, 8]);
}

#[test]
fn test_slice_of_empty_series() {
    let start = Instant::now();
    let ts = TimeSeries::new(SECOND, start, 16);
    assert_eq!(ts.get_slice_from_end(3), vec![0, 0, 0]);
}

#[test]
fn test_same_bucket_overwrites() {
    let start = Instant::now();
    let mut ts = TimeSeries::new(SECOND, start, 16);
    ts.set(start + Duration::from_millis(200), 100);
    ts.set(start + Duration::from_millis(900), 50);
    assert_eq!(ts.get_slice_from_end(1), vec![50]);
    assert_eq!(ts.size(), 1);
}

#[test]
fn test_gap_buckets_are_zero_filled() {
    let start = Instant::now();
    let mut ts = TimeSeries::new(SECOND, start, 16);
    ts.set(start, 5);
    ts.set(start + SECOND * 3, 9);
    assert_eq!(ts.get_slice_from_end(4), vec![5, 0, 0, 9]);
    assert_eq!(ts.size(), 4);
}

#[test]
fn test_ring_discards_old_buckets() {
    let start = Instant::now();
    let mut ts = TimeSeries::new(SECOND, start, 4);
    for i in 0..8u64 {
        ts.set(start + SECOND * i as u32, i + 1);
    }
    // Buckets 0..4 fell out of the window; a slice wider than the ring
    // zero-pads where history was discarded.
    assert_eq!(ts.get_slice_from_end(6), vec![0, 0, 5, 6, 7, 8]);
    assert_eq!(ts.size(), 8);
    assert_eq!(ts.capacity(), 4);
}

#[test]
fn test_stale_write_outside_window_is_dropped() {
    let start = Instant::now();
    let mut ts = TimeSeries::new(SECOND, start, 4);
    ts.set(start + SECOND * 9, 1);
    ts.set(start, 42);
    assert_eq!(ts.get(start), 0);
    assert_eq!(ts.get(start + SECOND * 9), 1);
}

#[test]
fn test_sparse_advance_past_window() {
    let start = Instant::now();
    let mut ts = TimeSeries::new(SECOND, start, 4);
    ts.set(start, 3);
    // Jump far beyond the ring; every retained bucket except the new
    // one must read as zero.
    ts.set(start + SECOND * 100, 9);
    assert_eq!(ts.get_slice_from_end(4), vec![0, 0, 0, 9]);
}

use crossbeam_channel::Sender;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::classifier;
use crate::models::{ClassifiedEvent, NetworkEvent, Protocol};

// Six-way port draw: each named port and the high-port bucket are equally
// likely.
const PORT_CHOICES: [u16; 5] = [21, 22, 80, 443, 3389];
const HIGH_PORT_RANGE: std::ops::RangeInclusive<u16> = 1000..=9999;

/// Draws one synthetic observation: a 192.168.x.y address, a port from the
/// named set or a random high port, and a uniform protocol.
pub fn synth_event<R: Rng + ?Sized>(rng: &mut R) -> NetworkEvent {
    let address = format!(
        "192.168.{}.{}",
        rng.gen_range(0..=255),
        rng.gen_range(1..=254)
    );
    let pick = rng.gen_range(0..=PORT_CHOICES.len());
    let port = if pick < PORT_CHOICES.len() {
        PORT_CHOICES[pick]
    } else {
        rng.gen_range(HIGH_PORT_RANGE)
    };
    let protocol = Protocol::ALL[rng.gen_range(0..Protocol::ALL.len())];
    NetworkEvent {
        address,
        port,
        protocol,
        observed_at: chrono::Utc::now(),
    }
}

/// Spawns the producer loop. The flag is checked at the top of every
/// iteration, so the worker quits within one interval of it clearing and
/// produces at most one more event after that.
pub(crate) fn spawn(
    running: Arc<AtomicBool>,
    interval: Duration,
    sender: Sender<ClassifiedEvent>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || produce(running, interval, sender))
}

fn produce(running: Arc<AtomicBool>, interval: Duration, sender: Sender<ClassifiedEvent>) {
    let mut rng = rand::thread_rng();
    while running.load(Ordering::SeqCst) {
        let event = synth_event(&mut rng);
        let assessment = classifier::assess_event(&event, &mut rng);
        if sender.send(ClassifiedEvent::new(event, assessment)).is_err() {
            break;
        }
        thread::sleep(interval);
    }
    tracing::debug!("event generator stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Instant;

    #[test]
    fn test_synth_event_shape() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..1000 {
            let event = synth_event(&mut rng);
            let octets: Vec<&str> = event.address.split('.').collect();
            assert_eq!(octets.len(), 4);
            assert_eq!(octets[0], "192");
            assert_eq!(octets[1], "168");
            let third: u16 = octets[2].parse().unwrap();
            let fourth: u16 = octets[3].parse().unwrap();
            assert!(third <= 255);
            assert!((1..=254).contains(&fourth));
            assert!(
                PORT_CHOICES.contains(&event.port) || HIGH_PORT_RANGE.contains(&event.port),
                "unexpected port {}",
                event.port
            );
        }
    }

    #[test]
    fn test_worker_stops_within_one_interval() {
        let (tx, rx) = unbounded();
        let running = Arc::new(AtomicBool::new(true));
        let interval = Duration::from_millis(10);
        let handle = spawn(running.clone(), interval, tx);

        // Let a few events through, then request a stop.
        for _ in 0..3 {
            rx.recv_timeout(Duration::from_secs(2)).expect("event");
        }
        running.store(false, Ordering::SeqCst);
        let stop_requested = Instant::now();
        handle.join().unwrap();
        assert!(stop_requested.elapsed() < Duration::from_secs(1));

        // At most one in-flight event may trail the request.
        let mut trailing = 0;
        while rx.try_recv().is_ok() {
            trailing += 1;
        }
        assert!(trailing <= 1, "got {trailing} events after stop");
    }

    #[test]
    fn test_worker_exits_when_receiver_dropped() {
        let (tx, rx) = unbounded();
        let running = Arc::new(AtomicBool::new(true));
        let handle = spawn(running.clone(), Duration::from_millis(5), tx);
        drop(rx);
        handle.join().unwrap();
    }
}

use bytering_spsc::RingBuffer;

// Deterministic byte pattern shared by the producer and the consumer.
fn pattern(i: usize) -> u8 {
    (i.wrapping_mul(31) % 251) as u8
}

#[test]
fn it_works() {
    const N: usize = 1_000_000;
    let (mut tx, mut rx) = RingBuffer::init(1_024).unwrap();

    let p = std::thread::spawn(move || {
        let mut chunk = [0u8; 97];
        let mut sent: usize = 0;
        while sent < N {
            // Uneven chunk sizes keep the copies straddling the physical
            // end of the storage.
            let want = (chunk.len()).min(N - sent).min(1 + sent % 89);
            for (k, slot) in chunk[..want].iter_mut().enumerate() {
                *slot = pattern(sent + k);
            }
            let n = tx.write(&chunk[..want]);
            if n == 0 {
                std::thread::yield_now();
            }
            sent += n;
        }
    });

    let c = std::thread::spawn(move || {
        let mut chunk = [0u8; 61];
        let mut received: usize = 0;
        while received < N {
            let want = (chunk.len()).min(N - received);
            let n = rx.read(&mut chunk[..want]);
            if n == 0 {
                std::thread::yield_now();
            }
            for (k, byte) in chunk[..n].iter().enumerate() {
                assert_eq!(*byte, pattern(received + k));
            }
            received += n;
        }
        assert_eq!(rx.read(&mut chunk), 0);
    });

    p.join().unwrap();
    c.join().unwrap();
}

#[test]
fn memcheck() {
    let (mut tx, rx) = RingBuffer::init(64).unwrap();
    assert_eq!(tx.write(&[0xA5; 100]), 100);
    drop(tx);
    drop(rx);
}

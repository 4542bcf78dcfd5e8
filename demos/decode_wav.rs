use std::io::Cursor;

use riffwave::Decoder;

const BLOCK_FRAMES: usize = 4096;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Write one second of a 440Hz sine so the demo needs no files on disk
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut bytes = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut bytes, spec)?;
        for t in 0..spec.sample_rate {
            let phase = t as f32 / spec.sample_rate as f32 * 440.0 * std::f32::consts::TAU;
            writer.write_sample((phase.sin() * i16::MAX as f32) as i16)?;
        }
        writer.finalize()?;
    }
    bytes.set_position(0);

    let sine = Decoder::from_reader(bytes).decode()?;
    assert_eq!(sine.channel_count(), 1);
    assert_eq!(sine.sample_rate(), 44100);
    println!("{}", sine);
    println!("duration: {:?}, peak: {}", sine.duration(), sine.peak());

    // Pull fixed-size interleaved blocks the way an output queue would
    let mut cursor = 0;
    let mut blocks = 0;
    loop {
        let block = sine.frames(cursor, BLOCK_FRAMES);
        if block.is_empty() {
            break;
        }
        let device: Vec<i16> = block.iter().map(|s| (s * i16::MAX as f32) as i16).collect();
        cursor += device.len() / usize::from(sine.channel_count());
        blocks += 1;
    }
    println!("{} blocks of up to {} frames", blocks, BLOCK_FRAMES);
    Ok(())
}
